//! Per-run resolution of Deel API credentials.
//!
//! Precedence: stored settings row > environment variable > hardcoded
//! default. Only the base URL has a default; a run without a token is a
//! configuration error.

use deelbridge_core::ports::SettingsStore;
use deelbridge_domain::constants::{
    DEFAULT_DEEL_BASE_URL, SETTING_AUTO_SYNC_ENABLED, SETTING_DEEL_API_TOKEN,
    SETTING_DEEL_BASE_URL,
};
use deelbridge_domain::{DeelApiConfig, DeelBridgeError, Result};

/// Environment variable fallback for the API token.
pub const ENV_DEEL_API_TOKEN: &str = "DEEL_API_TOKEN";

/// Environment variable fallback for the base URL.
pub const ENV_DEEL_BASE_URL: &str = "DEEL_API_BASE_URL";

/// Resolve the Deel API credentials for one pipeline run.
///
/// # Errors
/// Returns `DeelBridgeError::Config` when no token is configured in
/// either the settings store or the environment.
pub async fn resolve_api_config(settings: &dyn SettingsStore) -> Result<DeelApiConfig> {
    let api_token = match non_empty(settings.get(SETTING_DEEL_API_TOKEN).await?) {
        Some(token) => token,
        None => non_empty(std::env::var(ENV_DEEL_API_TOKEN).ok()).ok_or_else(|| {
            DeelBridgeError::Config(
                "Deel API token not configured. Please configure in Deel Settings.".to_string(),
            )
        })?,
    };

    let base_url = non_empty(settings.get(SETTING_DEEL_BASE_URL).await?)
        .or_else(|| non_empty(std::env::var(ENV_DEEL_BASE_URL).ok()))
        .unwrap_or_else(|| DEFAULT_DEEL_BASE_URL.to_string());

    Ok(DeelApiConfig { base_url, api_token })
}

/// Whether the stored automation flag enables the scheduled run.
pub async fn auto_sync_enabled(settings: &dyn SettingsStore) -> Result<bool> {
    Ok(settings.get(SETTING_AUTO_SYNC_ENABLED).await?.as_deref() == Some("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use deelbridge_core::ports::SettingUpsert;
    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[derive(Default)]
    struct MemorySettings {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemorySettings {
        fn with(pairs: &[(&str, &str)]) -> Self {
            let store = Self::default();
            {
                let mut values = store.values.lock().unwrap();
                for (key, value) in pairs {
                    values.insert((*key).to_string(), (*value).to_string());
                }
            }
            store
        }
    }

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn upsert(&self, settings: &[SettingUpsert]) -> Result<()> {
            let mut values = self.values.lock().unwrap();
            for setting in settings {
                values.insert(setting.key.clone(), setting.value.clone());
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn stored_settings_take_precedence_over_environment() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        std::env::set_var(ENV_DEEL_API_TOKEN, "env-token");
        std::env::set_var(ENV_DEEL_BASE_URL, "http://env.example.com");

        let settings = MemorySettings::with(&[
            (SETTING_DEEL_API_TOKEN, "stored-token"),
            (SETTING_DEEL_BASE_URL, "http://stored.example.com"),
        ]);

        let config = resolve_api_config(&settings).await.expect("config resolves");
        assert_eq!(config.api_token, "stored-token");
        assert_eq!(config.base_url, "http://stored.example.com");

        std::env::remove_var(ENV_DEEL_API_TOKEN);
        std::env::remove_var(ENV_DEEL_BASE_URL);
    }

    #[tokio::test]
    async fn environment_fills_in_for_missing_rows() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        std::env::set_var(ENV_DEEL_API_TOKEN, "env-token");
        std::env::remove_var(ENV_DEEL_BASE_URL);

        let settings = MemorySettings::default();
        let config = resolve_api_config(&settings).await.expect("config resolves");

        assert_eq!(config.api_token, "env-token");
        assert_eq!(config.base_url, DEFAULT_DEEL_BASE_URL);

        std::env::remove_var(ENV_DEEL_API_TOKEN);
    }

    #[tokio::test]
    async fn missing_token_everywhere_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        std::env::remove_var(ENV_DEEL_API_TOKEN);

        let settings = MemorySettings::default();
        let result = resolve_api_config(&settings).await;

        assert!(matches!(result, Err(DeelBridgeError::Config(_))));
    }

    #[tokio::test]
    async fn blank_stored_token_falls_through_to_environment() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        std::env::set_var(ENV_DEEL_API_TOKEN, "env-token");

        let settings = MemorySettings::with(&[(SETTING_DEEL_API_TOKEN, "   ")]);
        let config = resolve_api_config(&settings).await.expect("config resolves");
        assert_eq!(config.api_token, "env-token");

        std::env::remove_var(ENV_DEEL_API_TOKEN);
    }

    #[tokio::test]
    async fn auto_sync_flag_requires_exact_true() {
        let settings = MemorySettings::with(&[(SETTING_AUTO_SYNC_ENABLED, "true")]);
        assert!(auto_sync_enabled(&settings).await.expect("flag"));

        let settings = MemorySettings::with(&[(SETTING_AUTO_SYNC_ENABLED, "1")]);
        assert!(!auto_sync_enabled(&settings).await.expect("flag"));

        let settings = MemorySettings::default();
        assert!(!auto_sync_enabled(&settings).await.expect("flag"));
    }
}
