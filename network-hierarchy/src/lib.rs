//! # Network Hierarchy
//!
//! This crate keeps the supplier graph of the network a well-formed forest
//! and keeps every node's `level` equal to its distance from a root.
//!
//! ## Architecture
//!
//! 1. **Validator**: decides whether a supplier assignment is legal (factories
//!    are roots, no cycles). Read-only.
//! 2. **Level calculator**: derives a node's level by walking supplier links
//!    upward. Read-only.
//! 3. **Mutator**: validates, commits the direct change, then cascades level
//!    recomputation to every descendant and reports exactly what happened.
//! 4. **Forest**: whole-graph audit and from-scratch level computation, used
//!    for repair after a partial cascade.

pub mod config;
pub mod errors;
pub mod forest;
pub mod level;
pub mod mutator;
pub mod types;
pub mod validator;

pub use config::HierarchyConfig;
pub use errors::{HierarchyError, ValidationError};
pub use forest::{InvariantViolation, SupplierForest};
pub use level::LevelCalculator;
pub use mutator::HierarchyMutator;
pub use types::{CascadeFailure, CascadeStage, CascadeSummary, NodeMutation};
pub use validator::{Candidate, HierarchyValidator};
