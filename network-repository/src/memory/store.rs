//! In-memory implementation of the repository traits.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::{NodeRepository, ProductRepository};
use crate::memory::Snapshot;
use network_shared::{NetworkNode, Product};

/// Node rows plus the supplier -> clients index kept in step with them.
#[derive(Debug, Default)]
struct NodeTable {
    rows: HashMap<Uuid, NetworkNode>,
    clients: HashMap<Uuid, BTreeSet<Uuid>>,
}

impl NodeTable {
    fn link(&mut self, node_id: Uuid, supplier_id: Option<Uuid>) {
        if let Some(supplier_id) = supplier_id {
            self.clients.entry(supplier_id).or_default().insert(node_id);
        }
    }

    fn unlink(&mut self, node_id: &Uuid, supplier_id: Option<Uuid>) {
        if let Some(supplier_id) = supplier_id {
            if let Some(set) = self.clients.get_mut(&supplier_id) {
                set.remove(node_id);
                if set.is_empty() {
                    self.clients.remove(&supplier_id);
                }
            }
        }
    }

    fn upsert(&mut self, mut node: NetworkNode) {
        if let Some(existing) = self.rows.get(&node.id) {
            node.created_at = existing.created_at;
            let old_supplier = existing.supplier_id;
            self.unlink(&node.id, old_supplier);
        }
        self.link(node.id, node.supplier_id);
        self.rows.insert(node.id, node);
    }

    fn remove(&mut self, id: &Uuid) -> Option<NetworkNode> {
        let node = self.rows.remove(id)?;
        self.unlink(id, node.supplier_id);
        Some(node)
    }
}

/// Process-local store for nodes and products.
///
/// Each call takes the relevant lock for its own duration only; serializing
/// multi-step hierarchy mutations is the caller's responsibility.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    nodes: RwLock<NodeTable>,
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut table = NodeTable::default();
        for node in snapshot.nodes {
            table.upsert(node);
        }
        let products = snapshot
            .products
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        Self {
            nodes: RwLock::new(table),
            products: RwLock::new(products),
        }
    }

    /// Capture the current contents.
    ///
    /// Nodes are ordered by creation time and products by name so that
    /// successive snapshots of the same state are byte-identical.
    pub async fn snapshot(&self) -> Snapshot {
        let mut nodes: Vec<NetworkNode> = self.nodes.read().await.rows.values().cloned().collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Snapshot { nodes, products }
    }
}

#[async_trait]
impl NodeRepository for InMemoryStore {
    async fn get_node(&self, id: &Uuid) -> Result<Option<NetworkNode>, RepositoryError> {
        Ok(self.nodes.read().await.rows.get(id).cloned())
    }

    async fn find_clients(&self, supplier_id: &Uuid) -> Result<Vec<NetworkNode>, RepositoryError> {
        let table = self.nodes.read().await;
        let clients: Vec<NetworkNode> = table
            .clients
            .get(supplier_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| table.rows.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(clients)
    }

    async fn save_node(&self, node: &NetworkNode) -> Result<(), RepositoryError> {
        self.nodes.write().await.upsert(node.clone());
        debug!(node_id = %node.id, level = node.level, "Saved node");
        Ok(())
    }

    async fn delete_node(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        Ok(self.nodes.write().await.remove(id).is_some())
    }

    async fn list_nodes(&self) -> Result<Vec<NetworkNode>, RepositoryError> {
        Ok(self.nodes.read().await.rows.values().cloned().collect())
    }

    async fn count_nodes(&self) -> Result<usize, RepositoryError> {
        Ok(self.nodes.read().await.rows.len())
    }

    async fn clear_debt(&self, ids: &[Uuid]) -> Result<usize, RepositoryError> {
        let mut table = self.nodes.write().await;
        let mut updated = 0;
        for id in ids {
            if let Some(node) = table.rows.get_mut(id) {
                node.debt = Decimal::ZERO;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn get_product(&self, id: &Uuid) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn save_product(&self, product: &Product) -> Result<(), RepositoryError> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        Ok(self.products.write().await.remove(id).is_some())
    }

    async fn products_for_node(&self, node_id: &Uuid) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .filter(|product| product.is_available_at(node_id))
            .cloned()
            .collect())
    }

    async fn detach_node(&self, node_id: &Uuid) -> Result<usize, RepositoryError> {
        let mut products = self.products.write().await;
        let mut detached = 0;
        for product in products.values_mut() {
            if product.node_ids.remove(node_id) {
                detached += 1;
            }
        }
        Ok(detached)
    }
}
