//! Product repository trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryError;
use network_shared::Product;

/// Abstract interface for product catalog storage.
///
/// Products reference nodes through their `node_ids` set. The repository
/// does not check that those nodes exist; callers validate references.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Look up a product by identifier.
    async fn get_product(&self, id: &Uuid) -> Result<Option<Product>, RepositoryError>;

    /// Return every stored product. No ordering is guaranteed.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Insert a product or replace the stored copy.
    async fn save_product(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the product existed and was removed
    /// * `Ok(false)` - If there was nothing to remove
    async fn delete_product(&self, id: &Uuid) -> Result<bool, RepositoryError>;

    /// Return the products available at a node.
    async fn products_for_node(&self, node_id: &Uuid) -> Result<Vec<Product>, RepositoryError>;

    /// Remove a node from every product's availability set.
    ///
    /// Returns the number of products that referenced the node.
    async fn detach_node(&self, node_id: &Uuid) -> Result<usize, RepositoryError>;
}
