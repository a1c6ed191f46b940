//! Level computation.
//!
//! A node's level is the number of supplier hops between it and a root:
//! `0` without a supplier, otherwise the supplier's level plus one.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::{HierarchyError, ValidationError};
use network_repository::NodeRepository;
use network_shared::NetworkNode;

/// Computes levels by walking the supplier chain currently in storage.
///
/// Callers validate the chain first; the walk is nonetheless capped at the
/// node count so a corrupted store yields an error rather than a hang.
pub struct LevelCalculator {
    repo: Arc<dyn NodeRepository>,
}

impl LevelCalculator {
    /// Create a calculator reading from the given repository.
    pub fn new(repo: Arc<dyn NodeRepository>) -> Self {
        Self { repo }
    }

    /// Level of `node` given its current supplier link.
    pub async fn level_of(&self, node: &NetworkNode) -> Result<u32, HierarchyError> {
        self.level_under(node.supplier_id).await
    }

    /// Level a node would have under `supplier_id`.
    pub async fn level_under(&self, supplier_id: Option<Uuid>) -> Result<u32, HierarchyError> {
        let Some(start) = supplier_id else {
            return Ok(0);
        };

        let limit = self.repo.count_nodes().await?;
        let mut level = 0u32;
        let mut current = Some(start);

        while let Some(id) = current {
            if level as usize >= limit {
                return Err(ValidationError::CorruptedHierarchy { start, limit }.into());
            }
            let supplier = self
                .repo
                .get_node(&id)
                .await?
                .ok_or_else(|| HierarchyError::not_found(format!("supplier {} in chain", id)))?;
            level += 1;
            current = supplier.supplier_id;
        }

        Ok(level)
    }

    /// Level of a client of `supplier`, whose own level is already current.
    pub fn level_below(supplier: &NetworkNode) -> u32 {
        supplier.level + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use network_repository::InMemoryStore;
    use network_shared::{NewNode, NodeType};

    #[tokio::test]
    async fn test_root_is_level_zero() {
        let store = Arc::new(InMemoryStore::new());
        let calculator = LevelCalculator::new(store);
        let factory = NewNode::new("F", NodeType::Factory).into_node(0);

        assert_eq!(calculator.level_of(&factory).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counts_hops_ignoring_stored_levels() {
        let store = Arc::new(InMemoryStore::new());
        // Stored levels are deliberately wrong; only links count.
        let factory = NewNode::new("F", NodeType::Factory).into_node(7);
        let retail = NewNode::new("R", NodeType::Retail)
            .with_supplier(factory.id)
            .into_node(7);
        store.save_node(&factory).await.unwrap();
        store.save_node(&retail).await.unwrap();
        let calculator = LevelCalculator::new(store);

        let entrepreneur = NewNode::new("E", NodeType::Entrepreneur)
            .with_supplier(retail.id)
            .into_node(0);

        assert_eq!(calculator.level_of(&retail).await.unwrap(), 1);
        assert_eq!(calculator.level_of(&entrepreneur).await.unwrap(), 2);
        assert_eq!(LevelCalculator::level_below(&retail), 8);
    }

    #[tokio::test]
    async fn test_is_deterministic() {
        let store = Arc::new(InMemoryStore::new());
        let factory = NewNode::new("F", NodeType::Factory).into_node(0);
        store.save_node(&factory).await.unwrap();
        let calculator = LevelCalculator::new(store);

        let first = calculator.level_under(Some(factory.id)).await.unwrap();
        let second = calculator.level_under(Some(factory.id)).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_supplier_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        store
            .save_node(&NewNode::new("F", NodeType::Factory).into_node(0))
            .await
            .unwrap();
        let calculator = LevelCalculator::new(store);

        let err = calculator.level_under(Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, HierarchyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cycle_is_reported_not_looped() {
        let store = Arc::new(InMemoryStore::new());
        let mut a = NewNode::new("A", NodeType::Retail).into_node(0);
        let mut b = NewNode::new("B", NodeType::Retail).into_node(0);
        a.supplier_id = Some(b.id);
        b.supplier_id = Some(a.id);
        store.save_node(&a).await.unwrap();
        store.save_node(&b).await.unwrap();
        let calculator = LevelCalculator::new(store);

        let err = calculator.level_of(&a).await.unwrap_err();
        assert!(matches!(
            err,
            HierarchyError::Validation(ValidationError::CorruptedHierarchy { limit: 2, .. })
        ));
    }
}
