//! Error types for the remote data gateway client.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Retry policy class for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
}

/// Errors raised inside the client. None of these reach callers of
/// [`DataGatewayTrait`](foodrescue_core::remote::DataGatewayTrait); they are
/// logged and folded into a failure envelope.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad base URL, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Only transport failures are retried. The backend answers most
    /// errors with a 200 and an error body, so a non-2xx status is final.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Http(err) if is_transport_error(err) => RetryClass::Retryable,
            _ => RetryClass::Permanent,
        }
    }
}

fn is_transport_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_not_retried() {
        assert_eq!(
            GatewayError::api(503, "unavailable").retry_class(),
            RetryClass::Permanent
        );
        assert_eq!(
            GatewayError::invalid_request("bad url").retry_class(),
            RetryClass::Permanent
        );
    }

    #[test]
    fn malformed_body_is_permanent() {
        let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert_eq!(GatewayError::from(err).retry_class(), RetryClass::Permanent);
    }
}
