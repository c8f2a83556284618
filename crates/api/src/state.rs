//! Shared application state.

use std::sync::Arc;

use deelbridge_core::ports::{SettingsStore, TimeEntryStore};

use crate::auth::AuthConfig;

/// State shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub entries: Arc<dyn TimeEntryStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Assemble the application state from its collaborators.
    pub fn new(
        entries: Arc<dyn TimeEntryStore>,
        settings: Arc<dyn SettingsStore>,
        auth: AuthConfig,
    ) -> Self {
        Self { entries, settings, auth }
    }
}
