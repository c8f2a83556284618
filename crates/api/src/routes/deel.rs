//! Deel pipeline endpoints.
//!
//! Manual sync/submit triggers, the settings surface, and the
//! cron-callable endpoint that runs both stages back-to-back when the
//! stored automation flag is enabled. Completed runs map to 200 (clean)
//! or 207 (completed with per-entry errors); failures before the
//! pipeline starts map through the Deel error classification.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use deelbridge_core::ports::{SettingsStore, TimeEntryStore};
use deelbridge_core::{
    ContractSyncService, SettingUpsert, SubmitOptions, SyncOptions, TimesheetSubmitService,
};
use deelbridge_domain::constants::{
    SETTING_AUTO_SYNC_ENABLED, SETTING_DEEL_API_TOKEN, SETTING_DEEL_BASE_URL,
};
use deelbridge_domain::{DeelBridgeError, EntryStatus, SubmitReport, SyncReport};
use deelbridge_infra::config::{
    auto_sync_enabled, resolve_api_config, ENV_DEEL_API_TOKEN, ENV_DEEL_BASE_URL,
};
use deelbridge_infra::{DeelClient, DeelErrorCategory};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{require_any_role, Role};
use crate::state::AppState;

const PIPELINE_ROLES: &[Role] = &[Role::Admin, Role::Fleet];

/// Body overrides for `POST /deel/sync-contracts`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
    entry_status: Option<String>,
    contract_statuses: Option<Vec<String>>,
    overwrite_existing: Option<bool>,
}

/// Body overrides for `POST /deel/submit-timesheets`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitRequest {
    entry_status: Option<String>,
    auto_approve: Option<bool>,
    batch_size: Option<usize>,
    /// Delay between batches in milliseconds.
    batch_delay: Option<u64>,
}

/// Body for `POST /deel/settings`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsRequest {
    api_token: Option<String>,
    base_url: Option<String>,
    auto_sync_enabled: Option<bool>,
}

/// `GET /deel/sync-contracts` - contract sync statistics.
pub async fn get_sync_stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(rejection) = require_any_role(&state.auth, &headers, PIPELINE_ROLES) {
        return rejection;
    }

    match state.entries.contract_sync_stats().await {
        Ok(stats) => Json(json!({ "stats": stats })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `POST /deel/sync-contracts` - manually trigger a contract sync run.
pub async fn run_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<SyncRequest>>,
) -> Response {
    if let Err(rejection) = require_any_role(&state.auth, &headers, PIPELINE_ROLES) {
        return rejection;
    }
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    let entry_status = match parse_entry_status(request.entry_status.as_deref()) {
        Ok(status) => status,
        Err(response) => return response,
    };
    let options = SyncOptions {
        entry_status: Some(entry_status),
        contract_statuses: request.contract_statuses.unwrap_or_default(),
        overwrite_existing: request.overwrite_existing.unwrap_or(false),
    };

    let sync = match sync_service(&state).await {
        Ok(service) => service,
        Err(response) => return response,
    };

    let run_id = Uuid::new_v4();
    info!(%run_id, ?options, "starting contract sync");
    let report = sync.run(&options).await;

    sync_response(report)
}

/// `GET /deel/submit-timesheets` - submission statistics.
pub async fn get_submit_stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(rejection) = require_any_role(&state.auth, &headers, PIPELINE_ROLES) {
        return rejection;
    }

    match state.entries.submission_stats().await {
        Ok(stats) => Json(json!({ "stats": stats })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `POST /deel/submit-timesheets` - manually trigger a submission run.
pub async fn run_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<SubmitRequest>>,
) -> Response {
    if let Err(rejection) = require_any_role(&state.auth, &headers, PIPELINE_ROLES) {
        return rejection;
    }
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    let entry_status = match parse_entry_status(request.entry_status.as_deref()) {
        Ok(status) => status,
        Err(response) => return response,
    };
    let mut options = SubmitOptions {
        entry_status: Some(entry_status),
        auto_approve: request.auto_approve.unwrap_or(false),
        ..SubmitOptions::default()
    };
    if let Some(batch_size) = request.batch_size {
        options.batch_size = batch_size;
    }
    if let Some(batch_delay) = request.batch_delay {
        options.batch_delay = Duration::from_millis(batch_delay);
    }

    let submit = match submit_service(&state).await {
        Ok(service) => service,
        Err(response) => return response,
    };

    let run_id = Uuid::new_v4();
    info!(%run_id, ?options, "starting timesheet submission");
    let report = submit.run(&options).await;

    submit_response(report)
}

/// `GET /deel/cron` - scheduled run of both stages.
///
/// Intended to be called by an external cron service. Performs nothing
/// unless the stored automation flag is enabled.
pub async fn run_cron(State(state): State<AppState>) -> Response {
    let enabled = match auto_sync_enabled(state.settings.as_ref()).await {
        Ok(enabled) => enabled,
        Err(err) => return error_response(&err),
    };

    if !enabled {
        return Json(json!({
            "message": "Automated sync is currently disabled in Deel Settings",
            "enabled": false
        }))
        .into_response();
    }

    let sync = match sync_service(&state).await {
        Ok(service) => service,
        Err(response) => return response,
    };
    let submit = match submit_service(&state).await {
        Ok(service) => service,
        Err(response) => return response,
    };

    let run_id = Uuid::new_v4();
    info!(%run_id, "starting scheduled Deel processing");

    let sync_report = sync
        .run(&SyncOptions {
            entry_status: Some(EntryStatus::Pending),
            overwrite_existing: false,
            ..SyncOptions::default()
        })
        .await;

    let submit_report = submit
        .run(&SubmitOptions {
            entry_status: Some(EntryStatus::Pending),
            auto_approve: false,
            batch_size: 20,
            batch_delay: Duration::from_millis(500),
        })
        .await;

    if !sync_report.success || !submit_report.success {
        warn!(%run_id, "scheduled Deel processing completed with errors");
    }

    Json(json!({
        "message": "Automated Deel processing completed",
        "results": { "sync": sync_report, "submission": submit_report }
    }))
    .into_response()
}

/// `GET /deel/settings` - current Deel configuration, token masked.
pub async fn get_settings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(rejection) = require_any_role(&state.auth, &headers, PIPELINE_ROLES) {
        return rejection;
    }

    let stored_token = match state.settings.get(SETTING_DEEL_API_TOKEN).await {
        Ok(token) => token.filter(|t| !t.is_empty()),
        Err(err) => return error_response(&err),
    };
    let stored_base_url = match state.settings.get(SETTING_DEEL_BASE_URL).await {
        Ok(url) => url.filter(|u| !u.is_empty()),
        Err(err) => return error_response(&err),
    };
    let auto_sync = match auto_sync_enabled(state.settings.as_ref()).await {
        Ok(enabled) => enabled,
        Err(err) => return error_response(&err),
    };

    let env_token = std::env::var(ENV_DEEL_API_TOKEN).ok().filter(|t| !t.is_empty());
    let token_preview = match (&stored_token, &env_token) {
        (Some(token), _) => Some(format!("***{}", last_chars(token, 4))),
        (None, Some(_)) => Some("(from environment)".to_string()),
        (None, None) => None,
    };

    let base_url = stored_base_url
        .or_else(|| std::env::var(ENV_DEEL_BASE_URL).ok().filter(|u| !u.is_empty()))
        .unwrap_or_else(|| deelbridge_domain::constants::DEFAULT_DEEL_BASE_URL.to_string());

    Json(json!({
        "hasToken": stored_token.is_some() || env_token.is_some(),
        "tokenPreview": token_preview,
        "baseUrl": base_url,
        "autoSyncEnabled": auto_sync,
        "isProduction": base_url.contains("letsdeel.com"),
    }))
    .into_response()
}

/// `POST /deel/settings` - update Deel configuration.
pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<SettingsRequest>>,
) -> Response {
    if let Err(rejection) = require_any_role(&state.auth, &headers, PIPELINE_ROLES) {
        return rejection;
    }
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    if let Some(base_url) = request.base_url.as_deref() {
        if url::Url::parse(base_url).is_err() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid baseUrl: must be a valid URL" })),
            )
                .into_response();
        }
    }

    let mut upserts = Vec::new();

    if let Some(api_token) = request.api_token.as_deref() {
        let trimmed = api_token.trim();
        if trimmed.is_empty() {
            if let Err(err) = state.settings.delete(SETTING_DEEL_API_TOKEN).await {
                return error_response(&err);
            }
        } else {
            upserts.push(SettingUpsert {
                key: SETTING_DEEL_API_TOKEN.to_string(),
                value: trimmed.to_string(),
                description: Some("Deel API authentication token".to_string()),
            });
        }
    }

    if let Some(base_url) = request.base_url.as_deref() {
        upserts.push(SettingUpsert {
            key: SETTING_DEEL_BASE_URL.to_string(),
            value: base_url.trim().to_string(),
            description: Some("Deel API base URL".to_string()),
        });
    }

    if let Some(enabled) = request.auto_sync_enabled {
        upserts.push(SettingUpsert {
            key: SETTING_AUTO_SYNC_ENABLED.to_string(),
            value: enabled.to_string(),
            description: Some("Automated Deel sync toggle".to_string()),
        });
    }

    if !upserts.is_empty() {
        if let Err(err) = state.settings.upsert(&upserts).await {
            return error_response(&err);
        }
    }

    Json(json!({ "message": "Deel settings updated" })).into_response()
}

async fn sync_service(state: &AppState) -> Result<ContractSyncService, Response> {
    let gateway = gateway(state).await?;
    Ok(ContractSyncService::new(Arc::clone(&state.entries), gateway))
}

async fn submit_service(state: &AppState) -> Result<TimesheetSubmitService, Response> {
    let gateway = gateway(state).await?;
    Ok(TimesheetSubmitService::new(Arc::clone(&state.entries), gateway))
}

/// Resolve credentials and build a gateway for one run. Credentials may
/// change between runs through the settings surface, so this is done
/// per request.
async fn gateway(state: &AppState) -> Result<Arc<DeelClient>, Response> {
    let config =
        resolve_api_config(state.settings.as_ref()).await.map_err(|err| error_response(&err))?;
    let client = DeelClient::new(&config).map_err(|err| error_response(&err))?;
    Ok(Arc::new(client))
}

fn parse_entry_status(raw: Option<&str>) -> Result<EntryStatus, Response> {
    match raw {
        None => Ok(EntryStatus::Pending),
        Some(raw) => raw.parse().map_err(|err: DeelBridgeError| {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response()
        }),
    }
}

fn sync_response(report: SyncReport) -> Response {
    if !report.success && !report.errors.is_empty() {
        return (
            StatusCode::MULTI_STATUS,
            Json(json!({ "message": "Sync completed with errors", "result": report })),
        )
            .into_response();
    }

    Json(json!({ "message": "Contract sync completed successfully", "result": report }))
        .into_response()
}

fn submit_response(report: SubmitReport) -> Response {
    if !report.success && !report.errors.is_empty() {
        return (
            StatusCode::MULTI_STATUS,
            Json(json!({ "message": "Submission completed with errors", "result": report })),
        )
            .into_response();
    }

    Json(json!({ "message": "Timesheet submission completed successfully", "result": report }))
        .into_response()
}

/// Map a pre-pipeline failure onto a response via the Deel error
/// classification.
fn error_response(err: &DeelBridgeError) -> Response {
    let category = DeelErrorCategory::from_error(err);
    let status = StatusCode::from_u16(category.response_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    warn!(error = %err, category = %category, "request failed before pipeline run");

    (
        status,
        Json(json!({
            "error": category.user_message(),
            "category": category.to_string(),
            "transient": category.is_transient(),
            "details": err.to_string(),
        })),
    )
        .into_response()
}

fn last_chars(value: &str, n: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}
