//! Storage error types.

use std::path::PathBuf;

use bwac_models::ModelError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while writing output files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ModelError),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures of the file system itself (as opposed to bad input).
    pub fn is_file_system(&self) -> bool {
        matches!(self, StorageError::CreateDir { .. } | StorageError::Io { .. })
    }
}
