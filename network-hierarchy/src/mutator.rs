//! Hierarchy mutations.
//!
//! Every structural change goes through `HierarchyMutator`: validate, commit
//! the directly addressed node, then cascade level recomputation down the
//! client links. Validation and level computation never write; the cascade
//! is an explicit step whose outcome is reported to the caller.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::HierarchyConfig;
use crate::errors::HierarchyError;
use crate::forest::SupplierForest;
use crate::level::LevelCalculator;
use crate::types::{CascadeStage, CascadeSummary, NodeMutation};
use crate::validator::{Candidate, HierarchyValidator};
use network_repository::{NodeRepository, RepositoryError};
use network_shared::{NetworkNode, NewNode, NodeUpdate};

/// Orchestrates supplier changes, creation, deletion and repair.
///
/// Mutations are serialized through an internal gate so that no two of them
/// interleave their reads and writes. Readers that must not observe a
/// half-finished cascade hold [`HierarchyMutator::read_guard`] while reading.
pub struct HierarchyMutator {
    repo: Arc<dyn NodeRepository>,
    validator: HierarchyValidator,
    calculator: LevelCalculator,
    config: HierarchyConfig,
    gate: RwLock<()>,
}

impl HierarchyMutator {
    /// Create a mutator with default configuration.
    pub fn new(repo: Arc<dyn NodeRepository>) -> Self {
        Self::with_config(repo, HierarchyConfig::default())
    }

    /// Create a mutator with custom configuration.
    pub fn with_config(repo: Arc<dyn NodeRepository>, config: HierarchyConfig) -> Self {
        Self {
            validator: HierarchyValidator::new(repo.clone()),
            calculator: LevelCalculator::new(repo.clone()),
            repo,
            config,
            gate: RwLock::new(()),
        }
    }

    /// The repository mutations are written to.
    pub fn repository(&self) -> &Arc<dyn NodeRepository> {
        &self.repo
    }

    /// Shared access: excludes in-flight mutations, not other readers.
    pub async fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    /// Exclusive access, for non-structural writes (e.g. clearing debt) that
    /// must not interleave with a cascade.
    ///
    /// Must not be held while calling another method of this type.
    pub async fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    /// Create a node and compute its initial level.
    ///
    /// Only the factory rule applies: a node without an identity cannot close
    /// a cycle, and a new node has no clients to cascade to.
    ///
    /// # Returns
    ///
    /// * `Ok(NetworkNode)` - The node as stored, with its level
    /// * `Err(HierarchyError::Validation)` - If a factory is given a supplier
    /// * `Err(HierarchyError::NotFound)` - If the supplier does not exist
    #[instrument(skip(self, new), fields(name = %new.name, node_type = %new.node_type))]
    pub async fn create_node(&self, new: NewNode) -> Result<NetworkNode, HierarchyError> {
        let _gate = self.gate.write().await;
        let new = &new;

        let node = self
            .with_retry("create_node", move || self.try_create(new))
            .await?;

        info!(node_id = %node.id, level = node.level, "Created network node");
        Ok(node)
    }

    async fn try_create(&self, new: &NewNode) -> Result<NetworkNode, HierarchyError> {
        self.validator
            .validate(&Candidate::new_node(new.node_type), new.supplier_id)
            .await?;
        let level = self.calculator.level_under(new.supplier_id).await?;

        let node = new.clone().into_node(level);
        self.repo.save_node(&node).await?;
        Ok(node)
    }

    /// Apply a partial update to a node.
    ///
    /// The factory rule is checked whenever the type or the supplier is
    /// touched, the cycle rule whenever the supplier changes. Levels are
    /// recomputed and cascaded only when the supplier link actually changed.
    ///
    /// # Returns
    ///
    /// * `Ok(NodeMutation)` - The stored node and, if the link changed, the cascade summary
    /// * `Err(HierarchyError::Validation)` - If the change was rejected; nothing was written
    /// * `Err(HierarchyError::NotFound)` - If the node or the new supplier does not exist
    /// * `Err(HierarchyError::PartialCascade)` - If the node was written but some descendants were not
    #[instrument(skip(self, update))]
    pub async fn update_node(&self, id: Uuid, update: NodeUpdate) -> Result<NodeMutation, HierarchyError> {
        let _gate = self.gate.write().await;
        let update = &update;

        let (node, supplier_changed) = self
            .with_retry("update_node", move || self.try_update(id, update, false))
            .await?;

        let cascade = if supplier_changed {
            Some(self.finish_cascade(self.cascade_from(&node).await)?)
        } else {
            None
        };

        Ok(NodeMutation { node, cascade })
    }

    /// Point a node at a new supplier, or clear it with `None`.
    ///
    /// The node's level is recomputed and every descendant is cascaded even
    /// when the supplier is unchanged.
    ///
    /// # Returns
    ///
    /// * `Ok(CascadeSummary)` - Every descendant was updated
    /// * `Err(HierarchyError::Validation)` - If the assignment was rejected; nothing was written
    /// * `Err(HierarchyError::PartialCascade)` - If the node was written but some descendants were not
    #[instrument(skip(self))]
    pub async fn set_supplier(
        &self,
        id: Uuid,
        supplier_id: Option<Uuid>,
    ) -> Result<CascadeSummary, HierarchyError> {
        let _gate = self.gate.write().await;
        let update = &NodeUpdate::supplier(supplier_id);

        let (node, _) = self
            .with_retry("set_supplier", move || self.try_update(id, update, true))
            .await?;

        info!(node_id = %node.id, supplier_id = ?node.supplier_id, level = node.level, "Supplier changed");
        self.finish_cascade(self.cascade_from(&node).await)
    }

    /// Validate and commit the directly addressed node. Returns the stored
    /// node and whether the cascade has to run.
    async fn try_update(
        &self,
        id: Uuid,
        update: &NodeUpdate,
        force_cascade: bool,
    ) -> Result<(NetworkNode, bool), HierarchyError> {
        let mut node = self
            .repo
            .get_node(&id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(&id))?;

        let node_type = update.node_type.unwrap_or(node.node_type);
        let supplier_id = update.supplier_id.unwrap_or(node.supplier_id);
        let supplier_changed = supplier_id != node.supplier_id;

        if supplier_changed || node_type != node.node_type || force_cascade {
            self.validator
                .validate(&Candidate::existing(node.id, node_type), supplier_id)
                .await?;
        }

        node.apply(update);
        let relink = supplier_changed || force_cascade;
        if relink {
            node.level = self.calculator.level_of(&node).await?;
        }

        self.repo.save_node(&node).await?;
        debug!(node_id = %node.id, level = node.level, relink, "Committed node");
        Ok((node, relink))
    }

    /// Delete a node and detach its clients.
    ///
    /// Every direct client loses its supplier and becomes a root at level 0;
    /// their descendants are cascaded. Clients are never deleted.
    ///
    /// # Returns
    ///
    /// * `Ok(CascadeSummary)` - The former clients and their descendants, all updated
    /// * `Err(HierarchyError::NotFound)` - If the node does not exist
    /// * `Err(HierarchyError::PartialCascade)` - If the node was deleted but some descendants were not updated
    pub async fn delete_node(&self, id: Uuid) -> Result<CascadeSummary, HierarchyError> {
        self.delete_node_with(id, |_| async { Ok(()) }).await
    }

    /// Delete a node, then run `after_delete` before the gate is released.
    ///
    /// `after_delete` removes references to the node held outside this
    /// repository (product links, for instance). It runs once the row is gone,
    /// so no reader holding [`HierarchyMutator::read_guard`] can observe the
    /// node deleted but still referenced. A failure there does not undo the
    /// deletion: it is recorded against the deleted node with
    /// [`CascadeStage::Detach`] and reported as a partial cascade, alongside
    /// whatever the client cascade did.
    #[instrument(skip(self, after_delete))]
    pub async fn delete_node_with<F, Fut>(
        &self,
        id: Uuid,
        after_delete: F,
    ) -> Result<CascadeSummary, HierarchyError>
    where
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = Result<(), RepositoryError>>,
    {
        let _gate = self.gate.write().await;

        let clients = self
            .with_retry("delete_node", move || self.try_delete(id))
            .await?;

        info!(node_id = %id, clients = clients.len(), "Deleted network node");

        let mut summary = CascadeSummary::new(id);
        if let Err(e) = after_delete(id).await {
            warn!(node_id = %id, error = %e, "Failed to detach deleted node");
            summary.record_failure(id, CascadeStage::Detach, e);
        }

        let mut pending = Vec::with_capacity(clients.len());
        for mut client in clients {
            let changed = client.level != 0;
            client.supplier_id = None;
            client.level = 0;
            match self.repo.save_node(&client).await {
                Ok(()) => {
                    summary.record_success(client.id, changed);
                    pending.push(client);
                }
                Err(e) => summary.record_failure(client.id, CascadeStage::Save, e),
            }
        }

        let summary = self.run_cascade(summary, pending).await;
        self.finish_cascade(summary)
    }

    async fn try_delete(&self, id: Uuid) -> Result<Vec<NetworkNode>, HierarchyError> {
        if self.repo.get_node(&id).await?.is_none() {
            return Err(HierarchyError::node_not_found(&id));
        }
        let clients = self.repo.find_clients(&id).await?;
        self.repo.delete_node(&id).await?;
        Ok(clients)
    }

    /// Recompute levels from scratch and rewrite every node that is off.
    ///
    /// With `root`, only that node and its descendants are considered;
    /// otherwise the whole forest. Nodes whose level cannot be derived (cyclic
    /// or dangling chains) are reported as failures and left untouched.
    /// This is the remediation for a partial cascade.
    ///
    /// The summary's `origin` is `root`, or the nil id for a whole-graph pass.
    #[instrument(skip(self))]
    pub async fn repair(&self, root: Option<Uuid>) -> Result<CascadeSummary, HierarchyError> {
        let _gate = self.gate.write().await;

        let forest = SupplierForest::new(self.repo.list_nodes().await?);
        let scope: Vec<Uuid> = match root {
            Some(root) => {
                if forest.get(&root).is_none() {
                    return Err(HierarchyError::node_not_found(&root));
                }
                std::iter::once(root).chain(forest.descendants(&root)).collect()
            }
            None => {
                let mut ids: Vec<Uuid> = forest.nodes().map(|n| n.id).collect();
                ids.sort();
                ids
            }
        };
        let levels = forest.expected_levels();

        let mut summary = CascadeSummary::new(root.unwrap_or_default());
        for id in scope {
            let Some(node) = forest.get(&id) else { continue };
            let Some(&expected) = levels.get(&id) else {
                summary.record_failure(id, CascadeStage::Compute, "supplier chain is cyclic or dangling");
                continue;
            };
            if node.level == expected {
                continue;
            }
            let mut fixed = node.clone();
            fixed.level = expected;
            match self.repo.save_node(&fixed).await {
                Ok(()) => summary.record_success(id, true),
                Err(e) => summary.record_failure(id, CascadeStage::Save, e),
            }
        }

        if summary.is_complete() {
            info!(repaired = summary.changed, "Repair pass finished");
        } else {
            warn!(
                repaired = summary.changed,
                failed = summary.failed.len(),
                "Repair pass left nodes unrepaired"
            );
        }
        Ok(summary)
    }

    /// Cascade below a node whose own level was just committed.
    async fn cascade_from(&self, origin: &NetworkNode) -> CascadeSummary {
        self.run_cascade(CascadeSummary::new(origin.id), vec![origin.clone()])
            .await
    }

    /// Drain a work list of committed nodes, recomputing and writing the level
    /// of each of their clients. Explicit stack; no recursion.
    async fn run_cascade(&self, mut summary: CascadeSummary, pending: Vec<NetworkNode>) -> CascadeSummary {
        let mut visited: HashSet<Uuid> = pending.iter().map(|n| n.id).collect();
        visited.insert(summary.origin);
        let mut stack = pending;

        while let Some(parent) = stack.pop() {
            let clients = match self.repo.find_clients(&parent.id).await {
                Ok(clients) => clients,
                Err(e) => {
                    summary.record_failure(parent.id, CascadeStage::FindClients, e);
                    continue;
                }
            };

            for mut client in clients {
                if !visited.insert(client.id) {
                    warn!(node_id = %client.id, "Node reached twice during cascade, skipping");
                    continue;
                }
                let level = LevelCalculator::level_below(&parent);
                let changed = client.level != level;
                client.level = level;
                match self.repo.save_node(&client).await {
                    Ok(()) => {
                        summary.record_success(client.id, changed);
                        stack.push(client);
                    }
                    Err(e) => summary.record_failure(client.id, CascadeStage::Save, e),
                }
            }
        }

        debug!(
            origin = %summary.origin,
            succeeded = summary.succeeded.len(),
            changed = summary.changed,
            failed = summary.failed.len(),
            "Cascade finished"
        );
        summary
    }

    /// Turn an incomplete cascade into an error, logging it for operators.
    fn finish_cascade(&self, summary: CascadeSummary) -> Result<CascadeSummary, HierarchyError> {
        if summary.is_complete() {
            return Ok(summary);
        }
        error!(
            origin = %summary.origin,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            failed_ids = ?summary.failed.iter().map(|f| f.node_id).collect::<Vec<_>>(),
            "Cascade left descendant levels stale; run a repair pass"
        );
        Err(HierarchyError::PartialCascade(summary))
    }

    /// Run `op` again while storage reports a conflicting writer.
    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T, HierarchyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HierarchyError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match f().await {
                Err(e) if e.is_conflict() => {
                    if attempts > self.config.max_conflict_retries {
                        error!(op, attempts, error = %e, "Giving up after repeated conflicts");
                        return Err(HierarchyError::ConcurrencyConflict {
                            attempts,
                            message: e.to_string(),
                        });
                    }
                    warn!(op, attempts, error = %e, "Conflict, retrying");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                other => return other,
            }
        }
    }
}
