//! Bearer-token role gate for the pipeline endpoints.
//!
//! The hosting deployment hands out static bearer tokens per privilege
//! tier. Handlers call [`require_any_role`] before touching any
//! pipeline code; unauthorized requests receive a structured JSON
//! rejection.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Privilege tiers allowed to trigger the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Fleet,
}

impl Role {
    /// Stable lowercase name for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Fleet => "fleet",
        }
    }
}

/// Token-to-tier mapping loaded from service configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    admin_tokens: Vec<String>,
    fleet_tokens: Vec<String>,
}

impl AuthConfig {
    /// Build the mapping from configured token lists.
    #[must_use]
    pub fn new(admin_tokens: Vec<String>, fleet_tokens: Vec<String>) -> Self {
        Self { admin_tokens, fleet_tokens }
    }

    fn role_for_token(&self, token: &str) -> Option<Role> {
        if self.admin_tokens.iter().any(|t| t == token) {
            Some(Role::Admin)
        } else if self.fleet_tokens.iter().any(|t| t == token) {
            Some(Role::Fleet)
        } else {
            None
        }
    }
}

/// Resolve the caller's role, rejecting the request when it holds
/// neither of the allowed tiers.
///
/// # Errors
/// Returns a ready-to-send rejection response: 401 when no valid
/// bearer token is presented, 403 when the token's tier is not in
/// `allowed`.
pub fn require_any_role(
    auth: &AuthConfig,
    headers: &HeaderMap,
    allowed: &[Role],
) -> Result<Role, Response> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(rejection(StatusCode::UNAUTHORIZED, "Missing bearer token"));
    };

    let Some(role) = auth.role_for_token(token) else {
        return Err(rejection(StatusCode::UNAUTHORIZED, "Unknown bearer token"));
    };

    if !allowed.contains(&role) {
        return Err(rejection(StatusCode::FORBIDDEN, "Insufficient role"));
    }

    Ok(role)
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
