//! Error types for the analysis client.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the model API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model returned no candidate text.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The candidate text did not match the requested schema.
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("AI API key is not configured")]
    MissingApiKey,
}

impl AnalysisError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<AnalysisError> for foodrescue_core::Error {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::MissingApiKey => foodrescue_core::Error::Config(err.to_string()),
            other => foodrescue_core::Error::analysis(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_maps_to_config_error() {
        let err: foodrescue_core::Error = AnalysisError::MissingApiKey.into();
        assert!(matches!(err, foodrescue_core::Error::Config(_)));

        let err: foodrescue_core::Error = AnalysisError::EmptyResponse.into();
        assert!(matches!(err, foodrescue_core::Error::Analysis(_)));
    }
}
