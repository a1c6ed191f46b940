//! # Network Service
//!
//! Node and product operations for the supply network, built on the
//! hierarchy core, plus settings and dependency wiring for the `network`
//! command line tool.
//!
//! Input is checked field by field here; structural rules (factories are
//! roots, no cycles, consistent levels) are enforced by `network-hierarchy`.

pub mod config;
pub mod errors;
pub mod nodes;
pub mod products;
pub mod validation;

pub use config::{Dependencies, LogFormat, Settings};
pub use errors::ServiceError;
pub use nodes::{NodeDetail, NodeService};
pub use products::ProductService;
