//! Hierarchy error types.

use network_repository::RepositoryError;
use thiserror::Error;

use crate::errors::ValidationError;
use crate::types::CascadeSummary;

/// Errors that can occur during hierarchy operations.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// The change was rejected; nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced node does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The direct change committed but some descendants were not updated.
    #[error("Partial cascade failure: {0}")]
    PartialCascade(CascadeSummary),

    /// Storage kept reporting conflicting writers after every retry.
    #[error("Concurrency conflict after {attempts} attempts: {message}")]
    ConcurrencyConflict { attempts: u32, message: String },

    /// Storage failure outside of a cascade.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl HierarchyError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a not found error for a node identifier.
    pub fn node_not_found(id: &uuid::Uuid) -> Self {
        Self::NotFound(format!("network node {}", id))
    }

    /// Whether the operation was rejected without any state change.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }

    /// Whether retrying the whole operation may succeed.
    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_conflict())
    }
}
