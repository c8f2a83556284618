//! Configuration loading and Deel credential resolution.

pub mod loader;
pub mod resolver;

pub use loader::{load_config, load_from_env, load_from_file};
pub use resolver::{auto_sync_enabled, resolve_api_config, ENV_DEEL_API_TOKEN, ENV_DEEL_BASE_URL};
