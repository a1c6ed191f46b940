//! Interface definitions for network storage.
//!
//! The traits here are the only way the hierarchy core and the service layer
//! touch persisted state, so backends can be swapped and mocked in tests.

mod node_repository;
mod product_repository;

pub use node_repository::NodeRepository;
pub use product_repository::ProductRepository;
