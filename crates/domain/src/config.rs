//! Configuration structures.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DEEL_BASE_URL;

/// Credentials for the external Deel API.
///
/// Resolved per run with precedence stored settings row > environment
/// variable > hardcoded default (base URL only; there is no default
/// token).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeelApiConfig {
    pub base_url: String,
    pub api_token: String,
}

impl DeelApiConfig {
    /// Build a config against the default base URL.
    #[must_use]
    pub fn new(api_token: impl Into<String>) -> Self {
        Self { base_url: DEFAULT_DEEL_BASE_URL.to_string(), api_token: api_token.into() }
    }
}

/// Service configuration for the DeelBridge binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Bearer tokens granted the `admin` tier.
    #[serde(default)]
    pub admin_tokens: Vec<String>,
    /// Bearer tokens granted the `fleet` tier.
    #[serde(default)]
    pub fleet_tokens: Vec<String>,
}
