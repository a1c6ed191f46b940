//! In-memory storage backend.
//!
//! Holds nodes and products in process memory behind async locks. State can
//! be seeded from and written back to a JSON [`Snapshot`].

mod snapshot;
mod store;

pub use snapshot::Snapshot;
pub use store::InMemoryStore;
