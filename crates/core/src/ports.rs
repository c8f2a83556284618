//! Port interfaces for the persistent stores

use async_trait::async_trait;
use deelbridge_domain::{
    ContractSyncStats, EntryStatus, Result, SubmissionStats, TimeEntry,
};

/// Selection filter for the sync stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncFilter {
    /// Restrict candidates to entries in this submission status.
    pub entry_status: Option<EntryStatus>,
    /// When false, only entries without a resolved contract id are
    /// selected; when true, already-matched entries are included so the
    /// sync may overwrite them.
    pub include_matched: bool,
}

/// A sync candidate: the entry plus the profile email of its linked
/// user, resolved by the store in the same query.
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    pub entry: TimeEntry,
    pub profile_email: Option<String>,
}

impl SyncCandidate {
    /// Email used for contract lookup.
    ///
    /// Priority: the linked user's profile email, then the entry's own
    /// denormalized email field.
    #[must_use]
    pub fn lookup_email(&self) -> Option<&str> {
        self.profile_email.as_deref().or(self.entry.email.as_deref())
    }
}

/// Trait for time entry persistence operations used by the pipeline.
#[async_trait]
pub trait TimeEntryStore: Send + Sync {
    /// Fetch entries that are candidates for contract resolution.
    async fn find_sync_candidates(&self, filter: &SyncFilter) -> Result<Vec<SyncCandidate>>;

    /// Persist a resolved contract id on a single entry.
    async fn set_contract_id(&self, entry_id: &str, contract_id: &str) -> Result<()>;

    /// Fetch entries ready for submission: contract id resolved, no
    /// external timesheet id yet, optionally filtered by status, ordered
    /// by entry date then creation time ascending.
    async fn find_submittable(&self, entry_status: Option<EntryStatus>)
        -> Result<Vec<TimeEntry>>;

    /// Move an entry to `next`, rejecting transitions outside the
    /// lifecycle table with an `InvalidInput` error.
    async fn transition_status(&self, entry_id: &str, next: EntryStatus) -> Result<()>;

    /// Record the external timesheet id and mark the entry sent.
    async fn record_submission(&self, entry_id: &str, timesheet_id: &str) -> Result<()>;

    /// Grouped counts for the contract sync dashboard.
    async fn contract_sync_stats(&self) -> Result<ContractSyncStats>;

    /// Grouped counts for the submission dashboard.
    async fn submission_stats(&self) -> Result<SubmissionStats>;
}

/// A single key/value write applied by [`SettingsStore::upsert`].
#[derive(Debug, Clone)]
pub struct SettingUpsert {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// Trait for the settings store backing Deel configuration.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a single setting value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Apply a batch of upserts in one transaction.
    async fn upsert(&self, settings: &[SettingUpsert]) -> Result<()>;

    /// Remove a setting row if present.
    async fn delete(&self, key: &str) -> Result<()>;
}
