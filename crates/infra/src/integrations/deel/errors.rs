//! Deel-specific error classification
//!
//! Categorizes pipeline failures for operator-facing messaging and for
//! mapping top-level run failures onto HTTP response codes. The
//! pipeline itself never retries automatically; the manual-retry hint
//! only tells the operator whether re-running the stage is likely to
//! help.

use std::fmt;

use deelbridge_domain::DeelBridgeError;

/// Deel error category for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeelErrorCategory {
    /// Network is offline or unreachable
    NetworkOffline,

    /// Network request timed out
    NetworkTimeout,

    /// Deel is unavailable (5xx errors)
    ServerUnavailable,

    /// Authentication failed (401, 403)
    Authentication,

    /// Rate limit exceeded (429)
    RateLimited,

    /// Invalid request or data (4xx except 401, 403, 429)
    Validation,

    /// Local configuration problem (missing token, bad base URL)
    Configuration,

    /// Unknown or unclassified error
    Unknown,
}

impl DeelErrorCategory {
    /// Whether manually re-running the stage is likely to succeed
    /// without an operator fixing anything first.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::NetworkOffline | Self::NetworkTimeout | Self::ServerUnavailable | Self::RateLimited
        )
    }

    /// Operator-facing message for this category.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::NetworkOffline => {
                "Could not reach the Deel API. Check network connectivity and re-run the stage."
            }
            Self::NetworkTimeout => {
                "The Deel API took too long to respond. Re-run the stage in a few moments."
            }
            Self::ServerUnavailable => {
                "The Deel API is temporarily unavailable. This is usually short-lived; re-run \
                 the stage in a minute."
            }
            Self::Authentication => {
                "Deel rejected the API token. Update the token in Deel Settings."
            }
            Self::RateLimited => {
                "Deel is rate-limiting requests. Wait a couple of minutes, then re-run with a \
                 larger batch delay."
            }
            Self::Validation => {
                "Deel rejected the request data. Check the affected entries before re-running."
            }
            Self::Configuration => {
                "Deel API credentials are not configured. Set them in Deel Settings or the \
                 environment."
            }
            Self::Unknown => "An unexpected error occurred. Check the logs for details.",
        }
    }

    /// HTTP status code to report for a top-level failure in this
    /// category.
    #[must_use]
    pub fn response_status(self) -> u16 {
        match self {
            Self::Authentication => 502,
            Self::RateLimited => 503,
            Self::ServerUnavailable => 502,
            Self::NetworkOffline | Self::NetworkTimeout => 504,
            Self::Validation => 502,
            Self::Configuration => 500,
            Self::Unknown => 500,
        }
    }

    /// Classify an upstream HTTP status code.
    #[must_use]
    pub fn from_status_code(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimited,
            400..=499 => Self::Validation,
            500..=599 => Self::ServerUnavailable,
            _ => Self::Unknown,
        }
    }

    /// Classify a domain error produced anywhere in the pipeline.
    #[must_use]
    pub fn from_error(err: &DeelBridgeError) -> Self {
        match err {
            DeelBridgeError::Api { status, .. } => Self::from_status_code(*status),
            DeelBridgeError::Network(message) => {
                if message.contains("timed out") {
                    Self::NetworkTimeout
                } else {
                    Self::NetworkOffline
                }
            }
            DeelBridgeError::Config(_) => Self::Configuration,
            DeelBridgeError::Auth(_) => Self::Authentication,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DeelErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkOffline => write!(f, "Network Offline"),
            Self::NetworkTimeout => write!(f, "Network Timeout"),
            Self::ServerUnavailable => write!(f, "Server Unavailable"),
            Self::Authentication => write!(f, "Authentication Failed"),
            Self::RateLimited => write!(f, "Rate Limited"),
            Self::Validation => write!(f, "Validation Error"),
            Self::Configuration => write!(f, "Configuration Error"),
            Self::Unknown => write!(f, "Unknown Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_maps_to_authentication() {
        let category = DeelErrorCategory::from_status_code(401);
        assert_eq!(category, DeelErrorCategory::Authentication);
        assert!(!category.is_transient());
    }

    #[test]
    fn status_429_maps_to_rate_limited() {
        let category = DeelErrorCategory::from_status_code(429);
        assert_eq!(category, DeelErrorCategory::RateLimited);
        assert!(category.is_transient());
    }

    #[test]
    fn status_422_maps_to_validation() {
        let category = DeelErrorCategory::from_status_code(422);
        assert_eq!(category, DeelErrorCategory::Validation);
        assert!(!category.is_transient());
    }

    #[test]
    fn status_500_maps_to_server_unavailable() {
        let category = DeelErrorCategory::from_status_code(503);
        assert_eq!(category, DeelErrorCategory::ServerUnavailable);
        assert!(category.is_transient());
    }

    #[test]
    fn api_errors_classify_by_embedded_status() {
        let err = DeelBridgeError::Api { status: 403, body: "forbidden".into() };
        assert_eq!(DeelErrorCategory::from_error(&err), DeelErrorCategory::Authentication);
    }

    #[test]
    fn timeouts_classify_separately_from_offline() {
        let timeout = DeelBridgeError::Network("request timed out: deadline elapsed".into());
        assert_eq!(DeelErrorCategory::from_error(&timeout), DeelErrorCategory::NetworkTimeout);

        let refused = DeelBridgeError::Network("connection failed: refused".into());
        assert_eq!(DeelErrorCategory::from_error(&refused), DeelErrorCategory::NetworkOffline);
    }

    #[test]
    fn config_errors_report_internal_server_status() {
        let err = DeelBridgeError::Config("token missing".into());
        let category = DeelErrorCategory::from_error(&err);
        assert_eq!(category, DeelErrorCategory::Configuration);
        assert_eq!(category.response_status(), 500);
    }
}
