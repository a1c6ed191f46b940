//! Result types for hierarchy mutations.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use network_shared::NetworkNode;

/// Step of the cascade at which a descendant could not be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStage {
    /// Loading the clients of the node failed, so its subtree was not reached.
    FindClients,
    /// Writing the node's recomputed level failed. Its subtree was not reached.
    Save,
    /// The node's level could not be derived (dangling or cyclic supplier chain).
    Compute,
    /// References to a deleted node could not be removed. `node_id` is the
    /// deleted node itself.
    Detach,
}

/// A descendant the cascade could not bring up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeFailure {
    pub node_id: Uuid,
    pub stage: CascadeStage,
    pub error: String,
}

/// Outcome of propagating level changes below a node.
///
/// Every descendant reached is listed in `succeeded` or `failed`. A deletion
/// may also list the deleted node under `failed` when detaching it failed.
/// Nodes below a failed entry were not reached at all and still carry their
/// old level; a repair pass over `origin` brings them back in line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    /// The node whose change started the cascade.
    pub origin: Uuid,
    /// Descendants whose level was recomputed and written.
    pub succeeded: Vec<Uuid>,
    /// How many of `succeeded` actually changed level.
    pub changed: usize,
    /// Descendants that could not be processed.
    pub failed: Vec<CascadeFailure>,
}

impl CascadeSummary {
    /// Start an empty summary.
    pub fn new(origin: Uuid) -> Self {
        Self {
            origin,
            succeeded: Vec::new(),
            changed: 0,
            failed: Vec::new(),
        }
    }

    pub(crate) fn record_success(&mut self, node_id: Uuid, changed: bool) {
        self.succeeded.push(node_id);
        if changed {
            self.changed += 1;
        }
    }

    pub(crate) fn record_failure(&mut self, node_id: Uuid, stage: CascadeStage, error: impl ToString) {
        self.failed.push(CascadeFailure {
            node_id,
            stage,
            error: error.to_string(),
        });
    }

    /// Number of descendants reached.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every reached descendant was updated.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for CascadeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cascade from {}: {} succeeded, {} failed",
            self.origin,
            self.succeeded.len(),
            self.failed.len()
        )?;
        if let Some(first) = self.failed.first() {
            write!(f, " (first failure: {} at {:?}: {})", first.node_id, first.stage, first.error)?;
        }
        Ok(())
    }
}

/// Result of updating a single node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMutation {
    /// The node as written.
    pub node: NetworkNode,
    /// Present when the supplier link changed and descendants were cascaded.
    pub cascade: Option<CascadeSummary>,
}
