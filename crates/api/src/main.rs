//! DeelBridge - Deel payroll sync service
//!
//! Main entry point for the HTTP service.

use std::sync::Arc;

use anyhow::Context;
use deelbridge_api::auth::AuthConfig;
use deelbridge_api::{router, AppState};
use deelbridge_infra::config::load_config;
use deelbridge_infra::{DbManager, SqliteSettingsRepository, SqliteTimeEntryRepository};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env file loaded"),
    }

    let config = load_config().context("failed to load configuration")?;

    let db = Arc::new(
        DbManager::new(&config.database.path, config.database.pool_size)
            .context("failed to open database")?,
    );
    db.run_migrations().context("failed to run migrations")?;
    db.health_check().context("database health check failed")?;

    let entries = Arc::new(SqliteTimeEntryRepository::new(Arc::clone(&db)));
    let settings = Arc::new(SqliteSettingsRepository::new(Arc::clone(&db)));
    let auth =
        AuthConfig::new(config.server.admin_tokens.clone(), config.server.fleet_tokens.clone());

    let state = AppState::new(entries, settings, auth);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "DeelBridge listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
