//! # DeelBridge API
//!
//! HTTP trigger surface for the Deel pipeline: role-gated manual
//! endpoints for sync and submission, the settings endpoints, and the
//! scheduled (cron-callable) endpoint.

pub mod auth;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;

pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/deel/sync-contracts",
            get(routes::deel::get_sync_stats).post(routes::deel::run_sync),
        )
        .route(
            "/deel/submit-timesheets",
            get(routes::deel::get_submit_stats).post(routes::deel::run_submit),
        )
        .route("/deel/settings", get(routes::deel::get_settings).post(routes::deel::update_settings))
        .route("/deel/cron", get(routes::deel::run_cron))
        .route("/health", get(routes::health))
        .with_state(state)
}
