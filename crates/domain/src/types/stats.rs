//! Read-only aggregations over the time entry store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-status breakdown of contract resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub with_contract: i64,
    pub without_contract: i64,
}

/// Summary of time entries by contract sync state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSyncStats {
    pub total: i64,
    pub with_contract: i64,
    pub without_contract: i64,
    pub by_status: BTreeMap<String, StatusBreakdown>,
}

/// Summary of time entries by submission state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    pub total: i64,
    /// Entries with a resolved contract, no timesheet id, status pending.
    pub ready_to_submit: i64,
    /// Entries still missing a contract id.
    pub needs_contract_id: i64,
    /// Entries with a recorded external timesheet id.
    pub submitted: i64,
    pub by_status: BTreeMap<String, i64>,
}
