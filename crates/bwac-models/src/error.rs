//! Model error types.

use thiserror::Error;

/// Result type for record and timestamp decoding.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while decoding provider data.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn invalid_timestamp(raw: impl Into<String>) -> Self {
        Self::InvalidTimestamp(raw.into())
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}
