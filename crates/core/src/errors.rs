//! Error types for the food-rescue core crate.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core services.
///
/// Transport failures against the remote data gateway never show up here:
/// the gateway normalizes them into a failure envelope, which the typed
/// remote service turns into [`Error::Rejected`] carrying the envelope message.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend answered but did not accept the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// AI analysis could not be produced.
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Local persisted cache or outbox failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// True when the failure happened before anything left the device.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
