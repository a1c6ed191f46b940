//! Validation error types.
//!
//! A validation error means the requested supplier assignment was rejected
//! before anything was written.

use thiserror::Error;
use uuid::Uuid;

/// Reasons a supplier assignment is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Factories are always roots.
    #[error("A factory cannot have a supplier")]
    FactoryWithSupplier,

    /// The proposed supplier is the node itself or one of its descendants.
    #[error("Circular reference detected: {supplier_id} is supplied by {node_id}")]
    CircularReference { node_id: Uuid, supplier_id: Uuid },

    /// Walking the supplier chain took more hops than there are nodes.
    #[error("Supplier chain starting at {start} exceeds {limit} hops; the hierarchy is corrupted")]
    CorruptedHierarchy { start: Uuid, limit: usize },
}
