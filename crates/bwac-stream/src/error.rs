//! Ingestion error types.

use bwac_auth::AuthError;
use bwac_models::ModelError;
use bwac_storage::StorageError;
use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

/// Failures of a live session or a historic download.
///
/// Session expiry is not an error; see [`SessionOutcome`](crate::SessionOutcome).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{url} returned {status}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed record: {0}")]
    Record(#[from] ModelError),

    #[error("File system error: {0}")]
    FileSystem(StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidRecord(e) => IngestError::Record(e),
            other => IngestError::FileSystem(other),
        }
    }
}

impl IngestError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors that must stop the process instead of triggering a reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IngestError::FileSystem(_) | IngestError::Config(_))
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !self.is_fatal()
    }

    /// Short label used in logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            IngestError::Auth(_) => "auth",
            IngestError::Protocol(_)
            | IngestError::HttpStatus { .. }
            | IngestError::Network(_)
            | IngestError::Record(_) => "protocol",
            IngestError::FileSystem(_) => "filesystem",
            IngestError::Config(_) => "config",
        }
    }
}
