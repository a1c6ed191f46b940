//! JSON snapshot of the whole store.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::RepositoryError;
use network_shared::{NetworkNode, Product};

/// Serialized form of every node and product.
///
/// Decimals are written as strings, timestamps as RFC 3339 and node types in
/// lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Snapshot {
    /// Read a snapshot from disk.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, RepositoryError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
        Self::decode(&bytes)
    }

    /// Read a snapshot, or start empty if the file does not exist yet.
    #[instrument]
    pub async fn load_or_default(path: &Path) -> Result<Self, RepositoryError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Self::decode(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No snapshot found, starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(read_error(path, e)),
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self, RepositoryError> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;

        info!(
            nodes = snapshot.nodes.len(),
            products = snapshot.products.len(),
            "Loaded snapshot"
        );

        Ok(snapshot)
    }

    /// Write the snapshot to disk.
    ///
    /// The file is written next to the target and renamed into place, so a
    /// crash mid-write leaves the previous snapshot intact.
    #[instrument(skip(self), fields(nodes = self.nodes.len(), products = self.products.len()))]
    pub async fn save(&self, path: &Path) -> Result<(), RepositoryError> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json).await.map_err(|e| {
            RepositoryError::storage(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            RepositoryError::storage(format!("failed to replace {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Saved snapshot");
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> RepositoryError {
    RepositoryError::storage(format!("failed to read {}: {}", path.display(), err))
}
