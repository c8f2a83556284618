//! Run reports returned by the sync and submission engines.
//!
//! The engines never raise past their own boundary; every run produces
//! one of these reports and callers inspect `success` plus the error
//! list to decide how to respond.

use serde::{Deserialize, Serialize};

/// Outcome of one contract sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// True iff the error list is empty at the end of the run.
    pub success: bool,
    pub total_contracts: usize,
    pub total_time_entries: usize,
    pub entries_updated: usize,
    pub entries_without_contract: usize,
    /// Email index collisions observed while building the lookup.
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Outcome of one timesheet submission run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    /// True iff no entry failed during the run.
    pub success: bool,
    pub total_entries: usize,
    pub entries_submitted: usize,
    pub entries_failed: usize,
    pub entries_skipped: usize,
    pub errors: Vec<SubmitError>,
}

/// A single entry failure recorded during a submission run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitError {
    pub entry_id: String,
    pub error: String,
}
