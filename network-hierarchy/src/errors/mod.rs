//! Error types for the hierarchy subsystem.

mod hierarchy_error;
mod validation_error;

pub use hierarchy_error::HierarchyError;
pub use validation_error::ValidationError;
