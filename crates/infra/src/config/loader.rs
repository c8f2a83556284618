//! Service configuration loader
//!
//! Loads the DeelBridge service configuration from environment
//! variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DEELBRIDGE_DB_PATH`: Database file path
//! - `DEELBRIDGE_DB_POOL_SIZE`: Connection pool size
//! - `DEELBRIDGE_LISTEN_ADDR`: HTTP listen address
//! - `DEELBRIDGE_ADMIN_TOKENS`: Comma-separated admin bearer tokens
//! - `DEELBRIDGE_FLEET_TOKENS`: Comma-separated fleet bearer tokens

use std::path::{Path, PathBuf};

use deelbridge_domain::{Config, DatabaseConfig, DeelBridgeError, Result, ServerConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DeelBridgeError::Config` if configuration cannot be loaded
/// from either source.
pub fn load_config() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `DeelBridgeError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("DEELBRIDGE_DB_PATH")?;
    let db_pool_size = env_var("DEELBRIDGE_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| DeelBridgeError::Config(format!("Invalid pool size: {e}")))
    })?;
    let listen_addr = env_var("DEELBRIDGE_LISTEN_ADDR")?;
    let admin_tokens = env_token_list("DEELBRIDGE_ADMIN_TOKENS");
    let fleet_tokens = env_token_list("DEELBRIDGE_FLEET_TOKENS");

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        server: ServerConfig { listen_addr, admin_tokens, fleet_tokens },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DeelBridgeError::Config` if no file is found or parsing
/// fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DeelBridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DeelBridgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DeelBridgeError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DeelBridgeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DeelBridgeError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DeelBridgeError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe standard locations for a config file.
///
/// Searches the current working directory and up to two parent
/// directories for `config.{json,toml}` or `deelbridge.{json,toml}`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for dir in [cwd.clone(), cwd.join(".."), cwd.join("../..")] {
            candidates.extend([
                dir.join("config.json"),
                dir.join("config.toml"),
                dir.join("deelbridge.json"),
                dir.join("deelbridge.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DeelBridgeError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_token_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .ok()
        .map(|raw| {
            raw.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
        })
        .unwrap_or_default()
}
