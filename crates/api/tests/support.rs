//! Shared harness for router integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use deelbridge_api::auth::AuthConfig;
use deelbridge_api::{router, AppState};
use deelbridge_core::ports::{SettingsStore, TimeEntryStore};
use deelbridge_domain::{EntryStatus, TimeEntry};
use deelbridge_infra::{DbManager, SqliteSettingsRepository, SqliteTimeEntryRepository};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const FLEET_TOKEN: &str = "test-fleet-token";

/// A router wired to a throwaway database, plus direct repository
/// handles for seeding and asserting.
pub struct TestApp {
    pub app: Router,
    pub entries: Arc<SqliteTimeEntryRepository>,
    pub settings: Arc<SqliteSettingsRepository>,
    _temp_dir: TempDir,
}

pub fn build_app() -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir created");
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DbManager::new(&db_path, 4).expect("manager created"));
    db.run_migrations().expect("migrations run");

    let entries = Arc::new(SqliteTimeEntryRepository::new(Arc::clone(&db)));
    let settings = Arc::new(SqliteSettingsRepository::new(Arc::clone(&db)));
    let auth =
        AuthConfig::new(vec![ADMIN_TOKEN.to_string()], vec![FLEET_TOKEN.to_string()]);

    let entries_store: Arc<dyn TimeEntryStore> = entries.clone();
    let settings_store: Arc<dyn SettingsStore> = settings.clone();
    let state = AppState::new(entries_store, settings_store, auth);

    TestApp { app: router(state), entries, settings, _temp_dir: temp_dir }
}

/// Build a pending time entry for seeding.
pub fn pending_entry(id: &str, email: &str) -> TimeEntry {
    TimeEntry {
        id: id.to_string(),
        user_id: None,
        email: Some(email.to_string()),
        hours: 2,
        minutes: 15,
        category: "Driving".to_string(),
        notes: None,
        count: None,
        date: NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"),
        status: EntryStatus::Pending,
        contract_id: None,
        deel_timesheet_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).single().expect("valid timestamp"),
    }
}

/// Send one request through the router and decode the JSON response.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request built"),
        None => builder.body(Body::empty()).expect("request built"),
    };

    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };

    (status, json)
}
