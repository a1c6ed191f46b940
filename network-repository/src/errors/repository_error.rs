//! Repository error types.
//!
//! This module defines the error types that can occur during storage operations.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// A concurrent writer touched the same record. The operation may be retried.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed to read or write.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Failed to encode or decode stored data.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RepositoryError {
    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Whether retrying the whole operation may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
