//! # Network Repository
//!
//! This crate provides the storage seam of the supply network service: the
//! `NodeRepository` and `ProductRepository` traits, their error type, and an
//! in-memory implementation that can be loaded from and written back to a
//! JSON snapshot.

pub mod errors;
pub mod interfaces;
pub mod memory;

pub use errors::RepositoryError;
pub use interfaces::{NodeRepository, ProductRepository};
pub use memory::{InMemoryStore, Snapshot};
