//! Error types for the network repository.

mod repository_error;

pub use repository_error::RepositoryError;
