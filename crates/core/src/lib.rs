//! # DeelBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The contract sync and timesheet submission engines
//! - Port/adapter interfaces (traits)
//! - The email->contract lookup index
//!
//! ## Architecture Principles
//! - Only depends on `deelbridge-domain`
//! - No database or HTTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod contracts;
pub mod timesheets;

// Infrastructure ports
pub mod deel_ports;
pub mod ports;

// Re-export specific items to avoid ambiguity
pub use contracts::email_index::EmailIndex;
pub use contracts::{ContractSyncService, SyncOptions};
pub use deel_ports::{ContractQuery, DeelGateway, TimesheetDraft, TimesheetId};
pub use ports::{SettingUpsert, SettingsStore, SyncCandidate, SyncFilter, TimeEntryStore};
pub use timesheets::{SubmitOptions, TimesheetSubmitService};
