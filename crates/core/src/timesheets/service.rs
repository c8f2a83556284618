//! Timesheet submission engine.
//!
//! Selects entries with a resolved contract id and no prior submission,
//! converts durations to decimal hours, and submits them in fixed-size
//! sequential batches with an inter-batch delay. Each entry moves
//! through `pending -> processing -> {sent | failed}`; a failure while
//! recording the failed state is logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use deelbridge_domain::constants::{DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE};
use deelbridge_domain::{EntryStatus, Result, SubmissionStats, SubmitError, SubmitReport, TimeEntry};
use tracing::{debug, info, warn};

use crate::deel_ports::{DeelGateway, TimesheetDraft};
use crate::ports::TimeEntryStore;

/// Options for one submission run.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Only submit entries in this submission status.
    pub entry_status: Option<EntryStatus>,
    /// Ask Deel to auto-approve submitted timesheets.
    pub auto_approve: bool,
    /// Entries processed per batch.
    pub batch_size: usize,
    /// Fixed delay between batches.
    pub batch_delay: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            entry_status: None,
            auto_approve: false,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

/// Timesheet submission engine over the store and gateway ports.
pub struct TimesheetSubmitService {
    store: Arc<dyn TimeEntryStore>,
    gateway: Arc<dyn DeelGateway>,
}

impl TimesheetSubmitService {
    /// Create a new submission engine.
    pub fn new(store: Arc<dyn TimeEntryStore>, gateway: Arc<dyn DeelGateway>) -> Self {
        Self { store, gateway }
    }

    /// Run one submission pass. Never raises; the report carries all
    /// errors.
    pub async fn run(&self, options: &SubmitOptions) -> SubmitReport {
        let mut report = SubmitReport::default();
        let batch_size = options.batch_size.max(1);

        let entries = match self.store.find_submittable(options.entry_status).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "submittable query failed; aborting submission run");
                report.errors.push(SubmitError {
                    entry_id: "n/a".to_string(),
                    error: format!("Submission failed: {err}"),
                });
                return report;
            }
        };
        report.total_entries = entries.len();
        info!(count = report.total_entries, "found time entries ready for submission");

        if entries.is_empty() {
            report.success = true;
            return report;
        }

        let batch_count = entries.len().div_ceil(batch_size);
        for (batch_index, batch) in entries.chunks(batch_size).enumerate() {
            debug!(batch = batch_index + 1, of = batch_count, "processing submission batch");

            for entry in batch {
                self.submit_entry(entry, options, &mut report).await;
            }

            if batch_index + 1 < batch_count {
                debug!(delay_ms = options.batch_delay.as_millis() as u64, "waiting before next batch");
                tokio::time::sleep(options.batch_delay).await;
            }
        }

        report.success = report.entries_failed == 0;
        info!(
            submitted = report.entries_submitted,
            failed = report.entries_failed,
            skipped = report.entries_skipped,
            "timesheet submission complete"
        );
        report
    }

    async fn submit_entry(
        &self,
        entry: &TimeEntry,
        options: &SubmitOptions,
        report: &mut SubmitReport,
    ) {
        let Some(contract_id) = entry.contract_id.as_deref() else {
            debug!(entry_id = %entry.id, "skipping entry without contract id");
            report.entries_skipped += 1;
            return;
        };

        if let Err(err) = self.store.transition_status(&entry.id, EntryStatus::Processing).await {
            self.record_failure(entry, err.to_string(), report).await;
            return;
        }

        let draft = build_draft(entry, contract_id, options.auto_approve);
        debug!(
            entry_id = %entry.id,
            quantity = draft.quantity,
            date = %draft.date_submitted,
            "submitting timesheet"
        );

        match self.gateway.submit_timesheet(&draft).await {
            Ok(timesheet_id) => {
                match self.store.record_submission(&entry.id, &timesheet_id).await {
                    Ok(()) => {
                        debug!(entry_id = %entry.id, timesheet_id = %timesheet_id, "entry submitted");
                        report.entries_submitted += 1;
                    }
                    Err(err) => self.record_failure(entry, err.to_string(), report).await,
                }
            }
            Err(err) => self.record_failure(entry, err.to_string(), report).await,
        }
    }

    async fn record_failure(&self, entry: &TimeEntry, message: String, report: &mut SubmitReport) {
        warn!(entry_id = %entry.id, error = %message, "timesheet submission failed");
        report.entries_failed += 1;
        report.errors.push(SubmitError { entry_id: entry.id.clone(), error: message });

        // Secondary write failure: logged, never re-raised.
        if let Err(err) = self.store.transition_status(&entry.id, EntryStatus::Failed).await {
            warn!(entry_id = %entry.id, error = %err, "failed to mark entry as failed");
        }
    }

    /// Read-only dashboard aggregation.
    pub async fn stats(&self) -> Result<SubmissionStats> {
        self.store.submission_stats().await
    }
}

/// Convert split hours/minutes to decimal hours, exact to the stored
/// integers.
fn decimal_hours(hours: i64, minutes: i64) -> f64 {
    hours as f64 + minutes as f64 / 60.0
}

fn build_description(entry: &TimeEntry) -> String {
    let mut description = entry.category.clone();
    if let Some(notes) = entry.notes.as_deref() {
        description.push_str(" - ");
        description.push_str(notes);
    }
    if let Some(count) = entry.count {
        description.push_str(&format!(" (Count: {count})"));
    }
    description
}

fn build_draft(entry: &TimeEntry, contract_id: &str, auto_approve: bool) -> TimesheetDraft {
    TimesheetDraft {
        contract_id: contract_id.to_string(),
        quantity: decimal_hours(entry.hours, entry.minutes),
        description: build_description(entry),
        date_submitted: entry.date.format("%Y-%m-%d").to_string(),
        is_auto_approved: auto_approve,
    }
}
