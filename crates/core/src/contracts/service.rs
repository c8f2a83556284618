//! Contract sync engine.
//!
//! Correlates time entries to Deel contracts by email matching: fetches
//! the contract set, builds the email index, and persists resolved
//! contract ids entry by entry. Per-entry persistence failures are
//! isolated; only a failure before entry iteration begins aborts the
//! run.

use std::sync::Arc;

use deelbridge_domain::{ContractSyncStats, EntryStatus, Result, SyncReport};
use tracing::{debug, info, warn};

use super::email_index::EmailIndex;
use crate::deel_ports::{ContractQuery, DeelGateway};
use crate::ports::{SyncFilter, TimeEntryStore};

/// Options for one sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Only consider entries in this submission status.
    pub entry_status: Option<EntryStatus>,
    /// Deel contract statuses to fetch; empty fetches all contracts.
    pub contract_statuses: Vec<String>,
    /// Also refresh entries that already carry a contract id.
    pub overwrite_existing: bool,
}

/// Contract sync engine over the store and gateway ports.
pub struct ContractSyncService {
    store: Arc<dyn TimeEntryStore>,
    gateway: Arc<dyn DeelGateway>,
}

impl ContractSyncService {
    /// Create a new sync engine.
    pub fn new(store: Arc<dyn TimeEntryStore>, gateway: Arc<dyn DeelGateway>) -> Self {
        Self { store, gateway }
    }

    /// Run one sync pass. Never raises; the report carries all errors.
    pub async fn run(&self, options: &SyncOptions) -> SyncReport {
        let mut report = SyncReport::default();

        let query =
            ContractQuery { statuses: options.contract_statuses.clone(), ..ContractQuery::default() };
        let contracts = match self.gateway.fetch_contracts(&query).await {
            Ok(contracts) => contracts,
            Err(err) => {
                warn!(error = %err, "contract fetch failed; aborting sync run");
                report.errors.push(format!("Sync failed: {err}"));
                return report;
            }
        };
        report.total_contracts = contracts.len();

        let index = EmailIndex::build(&contracts);
        report.warnings = index.collisions().to_vec();
        info!(
            contracts = report.total_contracts,
            emails = index.len(),
            collisions = report.warnings.len(),
            "built email index"
        );

        let filter = SyncFilter {
            entry_status: options.entry_status,
            include_matched: options.overwrite_existing,
        };
        let candidates = match self.store.find_sync_candidates(&filter).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "candidate query failed; aborting sync run");
                report.errors.push(format!("Sync failed: {err}"));
                return report;
            }
        };
        report.total_time_entries = candidates.len();

        for candidate in &candidates {
            let Some(email) = candidate.lookup_email() else {
                report.entries_without_contract += 1;
                continue;
            };

            match index.resolve(email) {
                Some(contract_id) => {
                    match self.store.set_contract_id(&candidate.entry.id, contract_id).await {
                        Ok(()) => report.entries_updated += 1,
                        Err(err) => {
                            warn!(
                                entry_id = %candidate.entry.id,
                                error = %err,
                                "failed to persist contract id"
                            );
                            report
                                .errors
                                .push(format!("Failed to update entry {}: {err}", candidate.entry.id));
                        }
                    }
                }
                None => {
                    debug!(email, entry_id = %candidate.entry.id, "no contract found for email");
                    report.entries_without_contract += 1;
                }
            }
        }

        report.success = report.errors.is_empty();
        info!(
            updated = report.entries_updated,
            unmatched = report.entries_without_contract,
            errors = report.errors.len(),
            "contract sync complete"
        );
        report
    }

    /// Read-only dashboard aggregation.
    pub async fn stats(&self) -> Result<ContractSyncStats> {
        self.store.contract_sync_stats().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{NaiveDate, TimeZone, Utc};
    use deelbridge_domain::{
        AlternateEmail, Contract, ContractWorker, DeelBridgeError, SubmissionStats, TimeEntry,
    };
    use tokio::sync::Mutex;

    use super::*;
    use crate::deel_ports::{TimesheetDraft, TimesheetId};
    use crate::ports::SyncCandidate;

    fn entry(id: &str, email: Option<&str>, contract_id: Option<&str>) -> TimeEntry {
        TimeEntry {
            id: id.to_string(),
            user_id: None,
            email: email.map(str::to_string),
            hours: 1,
            minutes: 0,
            category: "Driving".to_string(),
            notes: None,
            count: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            status: EntryStatus::Pending,
            contract_id: contract_id.map(str::to_string),
            deel_timesheet_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
        }
    }

    fn candidate(id: &str, email: Option<&str>, profile_email: Option<&str>) -> SyncCandidate {
        SyncCandidate {
            entry: entry(id, email, None),
            profile_email: profile_email.map(str::to_string),
        }
    }

    fn contract_for(id: &str, email: &str) -> Contract {
        Contract {
            id: id.to_string(),
            title: None,
            status: "in_progress".to_string(),
            worker: Some(ContractWorker {
                id: format!("w-{id}"),
                email: Some(email.to_string()),
                full_name: None,
                alternate_email: Some(vec![AlternateEmail {
                    email: Some(format!("alt-{email}")),
                    is_verified: false,
                }]),
            }),
            is_archived: false,
            is_shielded: false,
        }
    }

    #[derive(Default)]
    struct MockStore {
        candidates: Vec<SyncCandidate>,
        fail_candidate_query: bool,
        fail_update_for: HashSet<String>,
        updates: Mutex<Vec<(String, String)>>,
        seen_filters: Mutex<Vec<SyncFilter>>,
    }

    impl MockStore {
        fn with_candidates(candidates: Vec<SyncCandidate>) -> Self {
            Self { candidates, ..Self::default() }
        }

        async fn updates(&self) -> Vec<(String, String)> {
            self.updates.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl TimeEntryStore for MockStore {
        async fn find_sync_candidates(&self, filter: &SyncFilter) -> Result<Vec<SyncCandidate>> {
            self.seen_filters.lock().await.push(*filter);
            if self.fail_candidate_query {
                return Err(DeelBridgeError::Database("candidate query failed".into()));
            }
            Ok(self.candidates.clone())
        }

        async fn set_contract_id(&self, entry_id: &str, contract_id: &str) -> Result<()> {
            if self.fail_update_for.contains(entry_id) {
                return Err(DeelBridgeError::Database(format!("write failed for {entry_id}")));
            }
            self.updates.lock().await.push((entry_id.to_string(), contract_id.to_string()));
            Ok(())
        }

        async fn find_submittable(
            &self,
            _entry_status: Option<EntryStatus>,
        ) -> Result<Vec<TimeEntry>> {
            Ok(Vec::new())
        }

        async fn transition_status(&self, _entry_id: &str, _next: EntryStatus) -> Result<()> {
            Ok(())
        }

        async fn record_submission(&self, _entry_id: &str, _timesheet_id: &str) -> Result<()> {
            Ok(())
        }

        async fn contract_sync_stats(&self) -> Result<ContractSyncStats> {
            Ok(ContractSyncStats::default())
        }

        async fn submission_stats(&self) -> Result<SubmissionStats> {
            Ok(SubmissionStats::default())
        }
    }

    struct MockGateway {
        contracts: Result<Vec<Contract>>,
        seen_queries: Mutex<Vec<ContractQuery>>,
    }

    impl MockGateway {
        fn with_contracts(contracts: Vec<Contract>) -> Self {
            Self { contracts: Ok(contracts), seen_queries: Mutex::new(Vec::new()) }
        }

        fn failing(err: DeelBridgeError) -> Self {
            Self { contracts: Err(err), seen_queries: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait::async_trait]
    impl DeelGateway for MockGateway {
        async fn fetch_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>> {
            self.seen_queries.lock().await.push(query.clone());
            self.contracts.clone()
        }

        async fn submit_timesheet(&self, _draft: &TimesheetDraft) -> Result<TimesheetId> {
            Err(DeelBridgeError::Internal("not used in sync tests".into()))
        }
    }

    fn service(store: Arc<MockStore>, gateway: Arc<MockGateway>) -> ContractSyncService {
        ContractSyncService::new(store, gateway)
    }

    #[tokio::test]
    async fn resolves_contract_ids_by_email() {
        let store = Arc::new(MockStore::with_candidates(vec![
            candidate("e-1", Some("ada@example.com"), None),
            candidate("e-2", None, Some("grace@example.com")),
        ]));
        let gateway = Arc::new(MockGateway::with_contracts(vec![
            contract_for("c-1", "ada@example.com"),
            contract_for("c-2", "grace@example.com"),
        ]));

        let report = service(store.clone(), gateway).run(&SyncOptions::default()).await;

        assert!(report.success);
        assert_eq!(report.total_contracts, 2);
        assert_eq!(report.total_time_entries, 2);
        assert_eq!(report.entries_updated, 2);
        assert_eq!(report.entries_without_contract, 0);
        assert_eq!(
            store.updates().await,
            vec![("e-1".to_string(), "c-1".to_string()), ("e-2".to_string(), "c-2".to_string())]
        );
    }

    #[tokio::test]
    async fn profile_email_takes_priority_over_entry_email() {
        let store = Arc::new(MockStore::with_candidates(vec![candidate(
            "e-1",
            Some("stale@example.com"),
            Some("current@example.com"),
        )]));
        let gateway = Arc::new(MockGateway::with_contracts(vec![
            contract_for("c-stale", "stale@example.com"),
            contract_for("c-current", "current@example.com"),
        ]));

        let report = service(store.clone(), gateway).run(&SyncOptions::default()).await;

        assert_eq!(report.entries_updated, 1);
        assert_eq!(store.updates().await, vec![("e-1".to_string(), "c-current".to_string())]);
    }

    #[tokio::test]
    async fn entries_without_any_email_count_as_unmatched() {
        let store = Arc::new(MockStore::with_candidates(vec![
            candidate("e-1", None, None),
            candidate("e-2", Some("nobody@example.com"), None),
        ]));
        let gateway = Arc::new(MockGateway::with_contracts(vec![contract_for(
            "c-1",
            "ada@example.com",
        )]));

        let report = service(store, gateway).run(&SyncOptions::default()).await;

        assert!(report.success);
        assert_eq!(report.entries_updated, 0);
        assert_eq!(report.entries_without_contract, 2);
    }

    #[tokio::test]
    async fn fetch_failure_short_circuits_with_one_error() {
        let store = Arc::new(MockStore::with_candidates(vec![candidate(
            "e-1",
            Some("ada@example.com"),
            None,
        )]));
        let gateway = Arc::new(MockGateway::failing(DeelBridgeError::Api {
            status: 503,
            body: "maintenance".into(),
        }));

        let report = service(store.clone(), gateway).run(&SyncOptions::default()).await;

        assert!(!report.success);
        assert_eq!(report.total_time_entries, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("503"));
        assert!(store.updates().await.is_empty());
    }

    #[tokio::test]
    async fn per_entry_write_failure_does_not_stop_the_loop() {
        let mut store = MockStore::with_candidates(vec![
            candidate("e-1", Some("ada@example.com"), None),
            candidate("e-2", Some("grace@example.com"), None),
        ]);
        store.fail_update_for.insert("e-1".to_string());
        let store = Arc::new(store);
        let gateway = Arc::new(MockGateway::with_contracts(vec![
            contract_for("c-1", "ada@example.com"),
            contract_for("c-2", "grace@example.com"),
        ]));

        let report = service(store.clone(), gateway).run(&SyncOptions::default()).await;

        assert!(!report.success);
        assert_eq!(report.entries_updated, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("e-1"));
        assert_eq!(store.updates().await, vec![("e-2".to_string(), "c-2".to_string())]);
    }

    #[tokio::test]
    async fn overwrite_flag_is_forwarded_to_the_store_filter() {
        let store = Arc::new(MockStore::with_candidates(Vec::new()));
        let gateway = Arc::new(MockGateway::with_contracts(Vec::new()));
        let options = SyncOptions {
            entry_status: Some(EntryStatus::Pending),
            overwrite_existing: true,
            ..SyncOptions::default()
        };

        service(store.clone(), gateway).run(&options).await;

        let filters = store.seen_filters.lock().await;
        assert_eq!(filters.len(), 1);
        assert!(filters[0].include_matched);
        assert_eq!(filters[0].entry_status, Some(EntryStatus::Pending));
    }

    #[tokio::test]
    async fn collision_warnings_surface_in_the_report() {
        let store = Arc::new(MockStore::with_candidates(Vec::new()));
        let gateway = Arc::new(MockGateway::with_contracts(vec![
            contract_for("c-1", "shared@example.com"),
            contract_for("c-2", "shared@example.com"),
        ]));

        let report = service(store, gateway).run(&SyncOptions::default()).await;

        assert!(report.success);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("shared@example.com"));
    }

    #[tokio::test]
    async fn second_run_at_fixed_point_updates_nothing() {
        // After a successful pass every entry carries a contract id, so
        // the store returns no unmatched candidates.
        let store = Arc::new(MockStore::with_candidates(Vec::new()));
        let gateway = Arc::new(MockGateway::with_contracts(vec![contract_for(
            "c-1",
            "ada@example.com",
        )]));

        let report = service(store, gateway).run(&SyncOptions::default()).await;

        assert!(report.success);
        assert_eq!(report.entries_updated, 0);
        assert_eq!(report.total_time_entries, 0);
    }
}
