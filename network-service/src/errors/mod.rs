//! Error types for the network service layer.

use network_hierarchy::HierarchyError;
use network_repository::RepositoryError;
use network_shared::PageOutOfRange;
use thiserror::Error;

/// Errors returned by node and product operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request itself is malformed; nothing was written.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A node or product the request names does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The hierarchy rejected the change or could not finish it.
    #[error("Hierarchy error: {0}")]
    Hierarchy(HierarchyError),

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Settings could not be read from the environment.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ServiceError {
    /// Create an invalid input error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the request was refused before anything was written.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::NotFound(_) => true,
            Self::Hierarchy(e) => e.is_rejection(),
            _ => false,
        }
    }
}

impl From<HierarchyError> for ServiceError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::NotFound(msg) => Self::NotFound(msg),
            HierarchyError::Repository(e) => Self::Repository(e),
            other => Self::Hierarchy(other),
        }
    }
}

impl From<PageOutOfRange> for ServiceError {
    fn from(err: PageOutOfRange) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
