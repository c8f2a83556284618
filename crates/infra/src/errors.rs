//! Conversions from infrastructure error types into the domain error.

use deelbridge_domain::DeelBridgeError;

/// Newtype carrying a domain error across `From` impls for foreign
/// error types (orphan-rule workaround).
#[derive(Debug)]
pub struct InfraError(pub DeelBridgeError);

impl From<rusqlite::Error> for InfraError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                Self(DeelBridgeError::NotFound("row not found".into()))
            }
            other => Self(DeelBridgeError::Database(other.to_string())),
        }
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        Self(DeelBridgeError::Database(format!("connection pool error: {err}")))
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self(DeelBridgeError::Network(format!("request timed out: {err}")))
        } else if err.is_connect() {
            Self(DeelBridgeError::Network(format!("connection failed: {err}")))
        } else {
            Self(DeelBridgeError::Network(err.to_string()))
        }
    }
}

impl From<InfraError> for DeelBridgeError {
    fn from(err: InfraError) -> Self {
        err.0
    }
}

/// Map a blocking-task join error; panics inside the task surface as
/// internal errors rather than propagating the panic.
pub(crate) fn map_join_error(err: tokio::task::JoinError) -> DeelBridgeError {
    if err.is_cancelled() {
        DeelBridgeError::Internal("database task cancelled".into())
    } else {
        DeelBridgeError::Internal(format!("database task panic: {err}"))
    }
}
