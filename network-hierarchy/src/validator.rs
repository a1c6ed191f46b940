//! Supplier assignment validation.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::errors::{HierarchyError, ValidationError};
use network_repository::NodeRepository;
use network_shared::{NetworkNode, NodeType};

/// The node a supplier is being proposed for.
///
/// `id` is absent for a node that has not been persisted yet; such a node has
/// no clients and cannot close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: Option<Uuid>,
    pub node_type: NodeType,
}

impl Candidate {
    /// A node about to be created.
    pub fn new_node(node_type: NodeType) -> Self {
        Self { id: None, node_type }
    }

    /// A persisted node, optionally with a changed type.
    pub fn existing(id: Uuid, node_type: NodeType) -> Self {
        Self {
            id: Some(id),
            node_type,
        }
    }
}

impl From<&NetworkNode> for Candidate {
    fn from(node: &NetworkNode) -> Self {
        Self::existing(node.id, node.node_type)
    }
}

/// Decides whether a supplier assignment keeps the graph a forest with
/// factories at the roots. Never writes.
pub struct HierarchyValidator {
    repo: Arc<dyn NodeRepository>,
}

impl HierarchyValidator {
    /// Create a validator reading from the given repository.
    pub fn new(repo: Arc<dyn NodeRepository>) -> Self {
        Self { repo }
    }

    /// Validate assigning `proposed_supplier` to `candidate`.
    ///
    /// Checks, in order:
    /// - a factory may not have a supplier;
    /// - the proposed supplier must exist;
    /// - for a persisted candidate, walking up from the proposed supplier must
    ///   not reach the candidate. The walk is bounded by the node count.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the assignment is legal
    /// * `Err(HierarchyError::Validation)` - If a rule rejects it
    /// * `Err(HierarchyError::NotFound)` - If the supplier or a node on its chain is missing
    pub async fn validate(
        &self,
        candidate: &Candidate,
        proposed_supplier: Option<Uuid>,
    ) -> Result<(), HierarchyError> {
        let Some(supplier_id) = proposed_supplier else {
            return Ok(());
        };

        if candidate.node_type == NodeType::Factory {
            return Err(ValidationError::FactoryWithSupplier.into());
        }

        let supplier = self
            .repo
            .get_node(&supplier_id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(format!("supplier {}", supplier_id)))?;

        if let Some(node_id) = candidate.id {
            self.check_acyclic(node_id, supplier).await?;
        }

        Ok(())
    }

    /// Walk upward from `supplier` and fail if `node_id` is on the chain.
    async fn check_acyclic(&self, node_id: Uuid, supplier: NetworkNode) -> Result<(), HierarchyError> {
        let limit = self.repo.count_nodes().await?;
        let start = supplier.id;
        let mut current = supplier;
        let mut hops = 0usize;

        loop {
            if current.id == node_id {
                debug!(node_id = %node_id, supplier_id = %start, "Rejected circular supplier");
                return Err(ValidationError::CircularReference {
                    node_id,
                    supplier_id: start,
                }
                .into());
            }

            let Some(next_id) = current.supplier_id else {
                return Ok(());
            };

            hops += 1;
            if hops > limit {
                return Err(ValidationError::CorruptedHierarchy { start, limit }.into());
            }

            let referenced_by = current.id;
            current = self.repo.get_node(&next_id).await?.ok_or_else(|| {
                HierarchyError::not_found(format!(
                    "supplier {} referenced by {}",
                    next_id, referenced_by
                ))
            })?;
        }
    }
}
