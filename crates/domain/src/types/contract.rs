//! Read-only view of Deel contract records.
//!
//! Contracts are never persisted locally; they exist only for the
//! duration of a sync run, deserialized straight from the contracts
//! endpoint.

use serde::{Deserialize, Serialize};

/// A payroll-platform record linking a worker identity to a billing
/// arrangement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub status: String,
    pub worker: Option<ContractWorker>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_shielded: bool,
}

/// Worker identity attached to a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractWorker {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub alternate_email: Option<Vec<AlternateEmail>>,
}

/// Alternate email record on a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateEmail {
    pub email: Option<String>,
    // The contracts endpoint spells this one camelCase.
    #[serde(default, alias = "isVerified")]
    pub is_verified: bool,
}
