//! Common data types used throughout the application

pub mod contract;
pub mod entry;
pub mod report;
pub mod stats;

pub use contract::{AlternateEmail, Contract, ContractWorker};
pub use entry::{EntryStatus, TimeEntry};
pub use report::{SubmitError, SubmitReport, SyncReport};
pub use stats::{ContractSyncStats, StatusBreakdown, SubmissionStats};
