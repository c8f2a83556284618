//! Time entry model and submission status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DeelBridgeError;

/// Submission status of a time entry.
///
/// Transitions within a single submission attempt are monotonic:
/// `pending -> processing -> {sent | failed}`. A failed entry may be
/// picked up again by a later run (`failed -> processing`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl EntryStatus {
    /// Canonical lowercase name as stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// Whether a transition from `self` to `next` is legal.
    ///
    /// The write layer rejects anything outside this table instead of
    /// leaving the lifecycle to caller discipline.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Failed, Self::Processing)
                | (Self::Processing, Self::Sent | Self::Failed)
        )
    }

}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = DeelBridgeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => {
                Err(DeelBridgeError::InvalidInput(format!("unknown entry status: {other}")))
            }
        }
    }
}

/// An internal record of worked time pending correlation and submission
/// to payroll.
///
/// Entries are created by the external time-recording flow; the sync
/// stage fills in `contract_id` and the submit stage fills in `status`
/// and `deel_timesheet_id`. A non-null `deel_timesheet_id` means the
/// entry has already been submitted and must never be re-sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    /// Owning user, when the entry is linked to an account.
    pub user_id: Option<String>,
    /// Denormalized email for entries without a user link.
    pub email: Option<String>,
    pub hours: i64,
    pub minutes: i64,
    pub category: String,
    pub notes: Option<String>,
    pub count: Option<i64>,
    pub date: NaiveDate,
    pub status: EntryStatus,
    pub contract_id: Option<String>,
    pub deel_timesheet_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
