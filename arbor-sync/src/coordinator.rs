//! Sync orchestration.
//!
//! ## `sync` — each step gates the next
//!
//! 1. Size-check and validate the submitted tree into an [`ArtifactTree`].
//! 2. Read the prior snapshot (for the change report only). A prior document
//!    that no longer decodes is treated as absent and gets overwritten.
//! 3. Collect file ids and ask the resolver which are already embedded.
//! 4. Diff: file ids not embedded, in submission order.
//! 5. Replace the stored snapshot under the key's lock.
//! 6. Return the diverging ids.
//!
//! Any failure in 1–4 returns before the store is touched. No lock is held
//! while the resolver runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use arbor_core::{
    compare, ArtifactNode, ArtifactTree, BranchName, CodebaseScope, SnapshotKey, TreeChanges,
};

use crate::config::SyncConfig;
use crate::diff::diff;
use crate::error::SyncError;
use crate::resolver::SyncedArtifactResolver;
use crate::store::TreeStore;

/// One client submission.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub scope: CodebaseScope,
    /// `None` means the configured default branch.
    pub branch: Option<BranchName>,
    pub tree: Vec<ArtifactNode>,
}

impl SyncRequest {
    pub fn new(scope: CodebaseScope, branch: Option<BranchName>, tree: Vec<ArtifactNode>) -> Self {
        Self {
            scope,
            branch,
            tree,
        }
    }
}

/// Outcome of a committed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub key: SnapshotKey,
    /// File ids that need (re-)embedding.
    pub diverging: Vec<String>,
    /// Ids added/removed relative to the prior snapshot.
    pub changes: TreeChanges,
    /// Generation committed by this sync.
    pub generation: u64,
    pub file_count: usize,
    pub directory_count: usize,
    /// Edges on the longest root-to-leaf path of the submitted tree.
    pub height: usize,
}

/// Validate → resolve → diff → persist.
pub struct SyncCoordinator<R, S> {
    resolver: Arc<R>,
    store: Arc<S>,
    config: SyncConfig,
}

impl<R, S> SyncCoordinator<R, S>
where
    R: SyncedArtifactResolver,
    S: TreeStore,
{
    pub fn new(resolver: Arc<R>, store: Arc<S>, config: SyncConfig) -> Self {
        Self {
            resolver,
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Store key for a request, substituting the default branch.
    pub fn key_for(&self, scope: &CodebaseScope, branch: Option<&BranchName>) -> SnapshotKey {
        scope.branch(
            branch
                .cloned()
                .unwrap_or_else(|| self.config.default_branch.clone()),
        )
    }

    /// Sync a tree and return the ids of files that need embedding.
    pub fn sync(&self, request: &SyncRequest) -> Result<Vec<String>, SyncError> {
        self.sync_report(request).map(|report| report.diverging)
    }

    /// [`Self::sync`] with the full [`SyncReport`].
    pub fn sync_report(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        let key = self.key_for(&request.scope, request.branch.as_ref());
        let result = self.run(&key, &request.tree);
        match &result {
            Ok(report) => tracing::info!(
                %key,
                nodes = request.tree.len(),
                diverging = report.diverging.len(),
                added = report.changes.added.len(),
                removed = report.changes.removed.len(),
                generation = report.generation,
                "sync committed"
            ),
            Err(err) => tracing::warn!(%key, kind = err.kind(), error = %err, "sync aborted"),
        }
        result
    }

    fn run(&self, key: &SnapshotKey, tree: &[ArtifactNode]) -> Result<SyncReport, SyncError> {
        let view = ArtifactTree::build_bounded(tree, self.config.max_nodes)?;

        let prior = match self.store.read(key) {
            Ok(prior) => prior,
            Err(err) if err.is_corrupt() => {
                tracing::warn!(%key, error = %err, "prior snapshot unreadable, replacing it");
                None
            }
            Err(err) => return Err(SyncError::StoreRead(err)),
        };
        let changes = match &prior {
            Some(snapshot) => compare(&snapshot.to_nodes(), tree),
            None => compare(&[], tree),
        };

        let file_ids: BTreeSet<String> = view.files().map(|n| n.id.clone()).collect();
        tracing::debug!(
            %key,
            root = %view.root().id,
            files = file_ids.len(),
            "resolving synced artifacts"
        );
        let known_synced = self.resolver.resolve(&key.scope, &file_ids)?;

        let diverging = diff(view.files(), &known_synced);

        let committed = self
            .store
            .replace(key, tree)
            .map_err(SyncError::StoreWrite)?;

        Ok(SyncReport {
            key: key.clone(),
            diverging,
            changes,
            generation: committed.generation,
            file_count: file_ids.len(),
            directory_count: view.len() - file_ids.len(),
            height: view.height(),
        })
    }

    /// The stored tree for `key` with each file's `synced` flag recomputed
    /// from the resolver. Directories report `synced = true`.
    pub fn annotated_tree(&self, key: &SnapshotKey) -> Result<Option<Vec<ArtifactNode>>, SyncError> {
        let Some(snapshot) = self.store.read(key).map_err(SyncError::StoreRead)? else {
            return Ok(None);
        };
        let mut nodes = snapshot.to_nodes();
        let file_ids: BTreeSet<String> = nodes
            .iter()
            .filter(|n| n.is_file())
            .map(|n| n.id.clone())
            .collect();
        let known_synced = self.resolver.resolve(&key.scope, &file_ids)?;
        for node in &mut nodes {
            node.synced = !node.is_file() || known_synced.contains(&node.id);
        }
        Ok(Some(nodes))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
