//! Dependency initialization and wiring for the network service.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::errors::ServiceError;
use crate::nodes::NodeService;
use crate::products::ProductService;
use network_hierarchy::HierarchyMutator;
use network_repository::{InMemoryStore, Snapshot};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Node operations.
    pub nodes: NodeService,
    /// Product operations.
    pub products: ProductService,
    store: Arc<InMemoryStore>,
    snapshot_path: PathBuf,
}

impl Dependencies {
    /// Load the snapshot named in `settings` and wire the services over it.
    ///
    /// A missing snapshot file starts an empty network.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If the snapshot exists but cannot be read
    pub async fn new(settings: &Settings) -> Result<Self, ServiceError> {
        info!(
            snapshot_path = %settings.snapshot_path.display(),
            max_conflict_retries = settings.hierarchy.max_conflict_retries,
            max_page_size = settings.max_page_size,
            "Initializing dependencies"
        );

        let snapshot = Snapshot::load_or_default(&settings.snapshot_path).await?;
        let store = Arc::new(InMemoryStore::from_snapshot(snapshot));

        Ok(Self::wire(store, settings))
    }

    fn wire(store: Arc<InMemoryStore>, settings: &Settings) -> Self {
        let mutator = Arc::new(HierarchyMutator::with_config(
            store.clone(),
            settings.hierarchy.clone(),
        ));
        let nodes = NodeService::new(mutator.clone(), store.clone(), settings.max_page_size);
        let products = ProductService::new(store.clone(), mutator, settings.max_page_size);

        Self {
            nodes,
            products,
            store,
            snapshot_path: settings.snapshot_path.clone(),
        }
    }

    /// Write the current state back to the snapshot file.
    pub async fn persist(&self) -> Result<(), ServiceError> {
        self.store.snapshot().await.save(&self.snapshot_path).await?;
        info!(snapshot_path = %self.snapshot_path.display(), "Snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use network_shared::{NewNode, NodeFilter, NodeType, PageRequest};

    fn temp_snapshot(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("network-deps-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let path = temp_snapshot("reload");
        let settings = Settings::default().with_snapshot_path(&path);

        let deps = Dependencies::new(&settings).await.unwrap();
        let node = deps
            .nodes
            .create(
                NewNode::new("Plant", NodeType::Factory)
                    .with_email("plant@example.com")
                    .with_address("DE", "Berlin", "Main st", "1"),
            )
            .await
            .unwrap();
        deps.persist().await.unwrap();

        let reloaded = Dependencies::new(&settings).await.unwrap();
        let page = reloaded
            .nodes
            .list(&NodeFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.results, vec![node]);

        let _ = std::fs::remove_file(&path);
    }
}
