//! Tree snapshot persistence.
//!
//! One snapshot per [`SnapshotKey`]. A replacement overwrites the whole
//! snapshot; readers observe either the old one or the new one, never a mix.
//! Only `{id, kind, parent_id}` is persisted per node.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use arbor_core::{ArtifactKind, ArtifactNode, SnapshotKey};

use crate::config::{StoreBackend, SyncConfig};
use crate::error::StoreError;
use crate::file_store::FileTreeStore;
use crate::locks::KeyLocks;

/// Persisted shape of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub parent_id: Option<String>,
}

impl From<&ArtifactNode> for StoredNode {
    fn from(node: &ArtifactNode) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            parent_id: node.parent_id.clone(),
        }
    }
}

impl From<&StoredNode> for ArtifactNode {
    fn from(node: &StoredNode) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            parent_id: node.parent_id.clone(),
            synced: false,
        }
    }
}

/// The latest committed tree for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub key: SnapshotKey,
    /// 1 for the first commit, +1 for each replacement after it.
    pub generation: u64,
    pub synced_at: DateTime<Utc>,
    pub nodes: Vec<StoredNode>,
}

impl TreeSnapshot {
    pub(crate) fn next(key: &SnapshotKey, prior_generation: u64, nodes: &[ArtifactNode]) -> Self {
        Self {
            key: key.clone(),
            generation: prior_generation + 1,
            synced_at: Utc::now(),
            nodes: nodes.iter().map(StoredNode::from).collect(),
        }
    }

    /// Nodes as [`ArtifactNode`]s with `synced` unset.
    pub fn to_nodes(&self) -> Vec<ArtifactNode> {
        self.nodes.iter().map(ArtifactNode::from).collect()
    }
}

/// Snapshot persistence keyed by (team, user, codebase, branch).
pub trait TreeStore: Send + Sync {
    fn read(&self, key: &SnapshotKey) -> Result<Option<TreeSnapshot>, StoreError>;

    /// Atomically overwrite the snapshot for `key` and return what was
    /// committed. On error the prior snapshot stays in place.
    fn replace(&self, key: &SnapshotKey, nodes: &[ArtifactNode])
        -> Result<TreeSnapshot, StoreError>;
}

/// Process-local store. Replacement swaps an `Arc` under the key's lock.
#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    snapshots: DashMap<SnapshotKey, Arc<TreeSnapshot>>,
    locks: KeyLocks,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys holding a snapshot.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl TreeStore for MemoryTreeStore {
    fn read(&self, key: &SnapshotKey) -> Result<Option<TreeSnapshot>, StoreError> {
        Ok(self.snapshots.get(key).map(|s| TreeSnapshot::clone(&s)))
    }

    fn replace(
        &self,
        key: &SnapshotKey,
        nodes: &[ArtifactNode],
    ) -> Result<TreeSnapshot, StoreError> {
        self.locks.with_key(key, || {
            let prior = self
                .snapshots
                .get(key)
                .map(|s| s.generation)
                .unwrap_or(0);
            let snapshot = TreeSnapshot::next(key, prior, nodes);
            self.snapshots.insert(key.clone(), Arc::new(snapshot.clone()));
            tracing::debug!(%key, generation = snapshot.generation, "memory snapshot replaced");
            Ok(snapshot)
        })
    }
}

/// The backend named by [`SyncConfig::store`].
#[derive(Debug)]
pub enum ConfiguredStore {
    Memory(MemoryTreeStore),
    File(FileTreeStore),
}

impl ConfiguredStore {
    pub fn from_config(config: &SyncConfig) -> Self {
        match config.store {
            StoreBackend::Memory => ConfiguredStore::Memory(MemoryTreeStore::new()),
            StoreBackend::File => ConfiguredStore::File(FileTreeStore::new(&config.data_dir)),
        }
    }
}

impl TreeStore for ConfiguredStore {
    fn read(&self, key: &SnapshotKey) -> Result<Option<TreeSnapshot>, StoreError> {
        match self {
            ConfiguredStore::Memory(store) => store.read(key),
            ConfiguredStore::File(store) => store.read(key),
        }
    }

    fn replace(
        &self,
        key: &SnapshotKey,
        nodes: &[ArtifactNode],
    ) -> Result<TreeSnapshot, StoreError> {
        match self {
            ConfiguredStore::Memory(store) => store.replace(key, nodes),
            ConfiguredStore::File(store) => store.replace(key, nodes),
        }
    }
}
