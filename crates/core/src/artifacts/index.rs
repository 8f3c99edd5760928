use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{ArtifactHandle, ArtifactKey, ArtifactKind, ArtifactStore};

/// Lookup table from `(run id, kind)` to an already-produced artifact.
///
/// Entries are recorded by the stages that produce them. A miss falls through to the
/// store, so artifacts written by a previous process are still found after restart.
pub struct ArtifactIndex {
    store: Arc<ArtifactStore>,
    entries: RwLock<HashMap<ArtifactKey, ArtifactHandle>>,
}

impl ArtifactIndex {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Target handle for producing an artifact.
    pub fn target(&self, run_id: &str, kind: ArtifactKind) -> ArtifactHandle {
        self.store.handle(ArtifactKey::new(run_id, kind))
    }

    /// Existing artifact for a key, if one was produced.
    pub async fn lookup(&self, run_id: &str, kind: ArtifactKind) -> Option<ArtifactHandle> {
        let key = ArtifactKey::new(run_id, kind);

        if let Some(handle) = self.entries.read().await.get(&key) {
            return Some(handle.clone());
        }

        match self.store.exists(&key).await {
            Ok(true) => {
                debug!("Found {} for run {} on disk", kind, run_id);
                let handle = self.store.handle(key.clone());
                self.entries.write().await.insert(key, handle.clone());
                Some(handle)
            }
            Ok(false) => None,
            Err(e) => {
                warn!("Artifact lookup for {} of run {} failed: {}", kind, run_id, e);
                None
            }
        }
    }

    /// Record a freshly produced artifact.
    pub async fn record(&self, handle: ArtifactHandle) {
        self.entries
            .write()
            .await
            .insert(handle.key.clone(), handle);
    }

    /// Drop an entry and its file so the next lookup misses.
    pub async fn invalidate(&self, run_id: &str, kind: ArtifactKind) {
        let key = ArtifactKey::new(run_id, kind);
        self.entries.write().await.remove(&key);
        if let Err(e) = self.store.discard(&key).await {
            warn!("Failed to discard {} of run {}: {}", kind, run_id, e);
        }
    }

    /// Number of cached entries.
    pub async fn cached_entries(&self) -> usize {
        self.entries.read().await.len()
    }
}
