//! Storage error type and its conversion into the core error.

use thiserror::Error;

/// Result type alias for storage internals.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The write actor is gone or dropped the reply.
    #[error("Writer error: {0}")]
    Writer(String),

    /// A core error raised inside a write job.
    #[error(transparent)]
    Core(#[from] foodrescue_core::Error),
}

impl From<StorageError> for foodrescue_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Core(inner) => inner,
            other => foodrescue_core::Error::storage(other.to_string()),
        }
    }
}
