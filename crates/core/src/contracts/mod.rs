//! Contract sync stage: email matching between time entries and Deel
//! contracts.

pub mod email_index;
pub mod service;

pub use service::{ContractSyncService, SyncOptions};
