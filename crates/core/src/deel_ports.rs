//! Deel integration port interfaces

use async_trait::async_trait;
use deelbridge_domain::{Contract, Result};

/// External timesheet identifier returned by the Deel API.
pub type TimesheetId = String;

/// Query parameters for the contracts endpoint.
#[derive(Debug, Clone, Default)]
pub struct ContractQuery {
    /// Page size hint; the API chooses its own default when absent.
    pub limit: Option<u32>,
    /// Contract lifecycle statuses to filter by; empty fetches all.
    pub statuses: Vec<String>,
    pub search: Option<String>,
}

/// A timesheet ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetDraft {
    pub contract_id: String,
    /// Worked time in decimal hours.
    pub quantity: f64,
    pub description: String,
    /// Calendar date formatted `YYYY-MM-DD`.
    pub date_submitted: String,
    pub is_auto_approved: bool,
}

/// Trait for Deel API operations.
#[async_trait]
pub trait DeelGateway: Send + Sync {
    /// Fetch all contracts matching the query, following pagination to
    /// the end. Fails on the first non-success page with no partial
    /// result.
    async fn fetch_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>>;

    /// Submit one timesheet and return its external identifier.
    async fn submit_timesheet(&self, draft: &TimesheetDraft) -> Result<TimesheetId>;
}
