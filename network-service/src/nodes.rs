//! Network node operations.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::products::product_view;
use crate::validation;
use network_hierarchy::{
    CascadeSummary, HierarchyMutator, InvariantViolation, NodeMutation, SupplierForest,
};
use network_repository::{NodeRepository, ProductRepository};
use network_shared::{
    NetworkNode, NetworkStatistics, NewNode, NodeFilter, NodeUpdate, Page, PageRequest, ProductView,
    SupplierSummary,
};

/// A node with its supplier and the products it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: NetworkNode,
    pub supplier_details: Option<SupplierSummary>,
    pub products: Vec<ProductView>,
}

/// Entry point for everything that touches network nodes.
///
/// Structural changes go through the [`HierarchyMutator`]; reads hold the
/// shared side of its gate so they never see a half-finished cascade.
pub struct NodeService {
    mutator: Arc<HierarchyMutator>,
    products: Arc<dyn ProductRepository>,
    max_page_size: usize,
}

impl NodeService {
    /// Create a new node service.
    pub fn new(
        mutator: Arc<HierarchyMutator>,
        products: Arc<dyn ProductRepository>,
        max_page_size: usize,
    ) -> Self {
        Self {
            mutator,
            products,
            max_page_size,
        }
    }

    fn nodes(&self) -> &dyn NodeRepository {
        self.mutator.repository().as_ref()
    }

    /// Create a node. Its level is computed from the supplier chain.
    pub async fn create(&self, new: NewNode) -> Result<NetworkNode, ServiceError> {
        validation::new_node(&new)?;
        Ok(self.mutator.create_node(new).await?)
    }

    /// Apply a partial update. Debt cannot be changed this way.
    pub async fn update(&self, id: Uuid, update: NodeUpdate) -> Result<NodeMutation, ServiceError> {
        validation::node_update(&update)?;
        Ok(self.mutator.update_node(id, update).await?)
    }

    /// Point a node at a new supplier or, with `None`, make it a root.
    pub async fn set_supplier(
        &self,
        id: Uuid,
        supplier_id: Option<Uuid>,
    ) -> Result<CascadeSummary, ServiceError> {
        Ok(self.mutator.set_supplier(id, supplier_id).await?)
    }

    /// Delete a node, detaching its clients and every product link to it.
    ///
    /// The product links are removed before the hierarchy gate is released,
    /// so a concurrent product write cannot relink the deleted node. If that
    /// fails the node stays deleted and the failure is reported in the
    /// partial cascade summary.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<CascadeSummary, ServiceError> {
        let products = &self.products;
        let summary = self
            .mutator
            .delete_node_with(id, |node_id| async move {
                products.detach_node(&node_id).await.map(|detached| {
                    debug!(node_id = %node_id, detached, "Detached node from products");
                })
            })
            .await?;
        Ok(summary)
    }

    /// Zero the debt of every listed node.
    ///
    /// All identifiers must exist; if any is unknown nothing is changed.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn clear_debt(&self, ids: &[Uuid]) -> Result<usize, ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::invalid("no node ids given"));
        }
        let ids: Vec<Uuid> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        let _gate = self.mutator.write_guard().await;
        let mut missing = Vec::new();
        for id in &ids {
            if self.nodes().get_node(id).await?.is_none() {
                missing.push(id.to_string());
            }
        }
        if !missing.is_empty() {
            warn!(missing = missing.len(), "Refusing to clear debt for unknown nodes");
            return Err(ServiceError::not_found(format!(
                "network nodes {}",
                missing.join(", ")
            )));
        }

        let cleared = self.nodes().clear_debt(&ids).await?;
        info!(cleared, "Cleared debt");
        Ok(cleared)
    }

    /// Fetch a node with its supplier summary and products.
    pub async fn detail(&self, id: Uuid) -> Result<NodeDetail, ServiceError> {
        let _gate = self.mutator.read_guard().await;
        let node = self
            .nodes()
            .get_node(&id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("network node {}", id)))?;

        let supplier_details = match node.supplier_id {
            Some(supplier_id) => self.nodes().get_node(&supplier_id).await?.map(|s| s.summary()),
            None => None,
        };

        let mut products = Vec::new();
        for product in self.products.products_for_node(&id).await? {
            products.push(product_view(self.nodes(), product).await?);
        }
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(NodeDetail {
            node,
            supplier_details,
            products,
        })
    }

    /// List nodes matching `filter`, newest first, one page at a time.
    pub async fn list(&self, filter: &NodeFilter, page: PageRequest) -> Result<Page<NetworkNode>, ServiceError> {
        let _gate = self.mutator.read_guard().await;
        let mut matching: Vec<NetworkNode> = self
            .nodes()
            .list_nodes()
            .await?
            .into_iter()
            .filter(|n| filter.matches(n))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(Page::paginate(matching, page, self.max_page_size)?)
    }

    /// Aggregate counts and debt over every node.
    pub async fn statistics(&self) -> Result<NetworkStatistics, ServiceError> {
        let _gate = self.mutator.read_guard().await;
        let nodes = self.nodes().list_nodes().await?;
        Ok(NetworkStatistics::from_nodes(&nodes))
    }

    /// Check the stored graph against every hierarchy invariant.
    pub async fn audit(&self) -> Result<Vec<InvariantViolation>, ServiceError> {
        let _gate = self.mutator.read_guard().await;
        let forest = SupplierForest::new(self.nodes().list_nodes().await?);
        Ok(forest.audit())
    }

    /// Rewrite stale levels below `root`, or across the whole graph.
    pub async fn repair(&self, root: Option<Uuid>) -> Result<CascadeSummary, ServiceError> {
        Ok(self.mutator.repair(root).await?)
    }
}
