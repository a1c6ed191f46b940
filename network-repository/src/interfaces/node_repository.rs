//! Node repository trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryError;
use network_shared::NetworkNode;

/// Abstract interface for network node storage.
///
/// The repository knows nothing about hierarchy rules: it stores whatever
/// node it is handed. Keeping the supplier graph a forest and keeping levels
/// consistent is the job of the caller.
///
/// The client relation is answered by `find_clients` (a find-by-supplier
/// query) rather than a stored back-reference, so the supplier field has a
/// single writer.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Look up a node by identifier.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(node))` - If the node exists
    /// * `Ok(None)` - If no node has this identifier
    /// * `Err(RepositoryError)` - If the lookup fails
    async fn get_node(&self, id: &Uuid) -> Result<Option<NetworkNode>, RepositoryError>;

    /// Return the direct clients of a node: every node whose supplier is `supplier_id`.
    ///
    /// No ordering is guaranteed.
    async fn find_clients(&self, supplier_id: &Uuid) -> Result<Vec<NetworkNode>, RepositoryError>;

    /// Insert a node or replace the stored copy.
    ///
    /// The creation timestamp of an existing row is never overwritten.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the node was written
    /// * `Err(RepositoryError::Conflict)` - If a concurrent writer got there first
    /// * `Err(RepositoryError)` - If the write fails
    async fn save_node(&self, node: &NetworkNode) -> Result<(), RepositoryError>;

    /// Delete a node. Supplier references held by other nodes are left as is.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the node existed and was removed
    /// * `Ok(false)` - If there was nothing to remove
    async fn delete_node(&self, id: &Uuid) -> Result<bool, RepositoryError>;

    /// Return every stored node. No ordering is guaranteed.
    async fn list_nodes(&self) -> Result<Vec<NetworkNode>, RepositoryError>;

    /// Total number of stored nodes.
    async fn count_nodes(&self) -> Result<usize, RepositoryError>;

    /// Set the debt of every listed node to zero.
    ///
    /// Unknown identifiers are skipped. Returns the number of nodes updated.
    async fn clear_debt(&self, ids: &[Uuid]) -> Result<usize, RepositoryError>;
}
