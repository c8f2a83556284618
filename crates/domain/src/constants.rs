//! Domain constants.

/// Base URL used when neither a stored setting nor an environment
/// variable provides one. Points at the local Deel sandbox.
pub const DEFAULT_DEEL_BASE_URL: &str = "http://localhost:4000";

/// Default number of entries submitted per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default delay between submission batches, in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1000;

/// Settings row holding the Deel API token.
pub const SETTING_DEEL_API_TOKEN: &str = "deel_api_token";

/// Settings row holding the Deel API base URL.
pub const SETTING_DEEL_BASE_URL: &str = "deel_api_base_url";

/// Settings row gating the scheduled sync/submit run.
pub const SETTING_AUTO_SYNC_ENABLED: &str = "deel_auto_sync_enabled";
