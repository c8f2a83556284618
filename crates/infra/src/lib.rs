//! # DeelBridge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite via r2d2 pool)
//! - HTTP client implementation
//! - The Deel API integration
//! - Configuration loading and credential resolution
//!
//! ## Architecture
//! - Implements traits defined in `deelbridge-core`
//! - Contains all "impure" code (I/O, external services)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use config::{load_config, resolve_api_config};
pub use database::{DbManager, SqliteSettingsRepository, SqliteTimeEntryRepository};
pub use http::HttpClient;
pub use integrations::deel::{DeelClient, DeelErrorCategory};
