//! Synced-artifact lookup.
//!
//! The coordinator only knows the [`SyncedArtifactResolver`] contract: given
//! candidate file ids, which of them already have a completed embedding for
//! this team/user/codebase. Embeddings are branch-agnostic.
//!
//! [`EmbeddingLedger`] is the in-process implementation. It keeps every
//! embedding attempt and answers with the same rule the warehouse query uses:
//! per artifact id the most recent attempt is authoritative, and only its
//! existence matters.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use arbor_core::CodebaseScope;

use crate::error::ResolverError;

/// Read-only capability answering "which of these files are already embedded".
pub trait SyncedArtifactResolver: Send + Sync {
    /// Return the subset of `artifact_ids` with a completed embedding in
    /// `scope`.
    fn resolve(
        &self,
        scope: &CodebaseScope,
        artifact_ids: &BTreeSet<String>,
    ) -> Result<HashSet<String>, ResolverError>;
}

/// One embedding attempt for an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub scope: CodebaseScope,
    pub artifact_id: String,
    /// Number of vector chunks written for the file.
    pub chunks: usize,
    pub recorded_at: DateTime<Utc>,
    /// Tombstone: the embedding was dropped.
    pub deleted: bool,
}

type ScopeLedger = HashMap<String, Vec<EmbeddingRecord>>;

/// In-memory embedding history, scoped per codebase.
#[derive(Debug, Default)]
pub struct EmbeddingLedger {
    records: RwLock<HashMap<CodebaseScope, ScopeLedger>>,
    offline: AtomicBool,
}

impl EmbeddingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed embedding of `artifact_id` now.
    pub fn record_embedding(&self, scope: &CodebaseScope, artifact_id: &str, chunks: usize) {
        self.record(scope, artifact_id, chunks, Utc::now(), false);
    }

    /// Record that the embedding of `artifact_id` was dropped now.
    pub fn record_deletion(&self, scope: &CodebaseScope, artifact_id: &str) {
        self.record(scope, artifact_id, 0, Utc::now(), true);
    }

    /// Record an attempt with an explicit timestamp.
    pub fn record(
        &self,
        scope: &CodebaseScope,
        artifact_id: &str,
        chunks: usize,
        recorded_at: DateTime<Utc>,
        deleted: bool,
    ) {
        self.records
            .write()
            .entry(scope.clone())
            .or_default()
            .entry(artifact_id.to_owned())
            .or_default()
            .push(EmbeddingRecord {
                scope: scope.clone(),
                artifact_id: artifact_id.to_owned(),
                chunks,
                recorded_at,
                deleted,
            });
    }

    /// Authoritative attempt for `artifact_id`: greatest `recorded_at`, the
    /// later insertion on ties.
    pub fn latest(&self, scope: &CodebaseScope, artifact_id: &str) -> Option<EmbeddingRecord> {
        let records = self.records.read();
        records
            .get(scope)
            .and_then(|ledger| ledger.get(artifact_id))
            .and_then(|attempts| latest_of(attempts))
            .cloned()
    }

    /// Simulate the backing warehouse going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }
}

fn latest_of(attempts: &[EmbeddingRecord]) -> Option<&EmbeddingRecord> {
    // max_by_key returns the last maximum, so later insertions win ties.
    attempts.iter().max_by_key(|r| r.recorded_at)
}

impl SyncedArtifactResolver for EmbeddingLedger {
    fn resolve(
        &self,
        scope: &CodebaseScope,
        artifact_ids: &BTreeSet<String>,
    ) -> Result<HashSet<String>, ResolverError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ResolverError::Unavailable(format!(
                "embedding ledger offline for {scope}"
            )));
        }
        if artifact_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let records = self.records.read();
        let Some(ledger) = records.get(scope) else {
            return Ok(HashSet::new());
        };

        let synced = artifact_ids
            .iter()
            .filter(|id| {
                ledger
                    .get(id.as_str())
                    .and_then(|attempts| latest_of(attempts))
                    .is_some_and(|r| !r.deleted)
            })
            .cloned()
            .collect();
        Ok(synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scope() -> CodebaseScope {
        CodebaseScope::new(1, 10, "cb")
    }

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn returns_only_embedded_candidates() {
        let ledger = EmbeddingLedger::new();
        ledger.record_embedding(&scope(), "file_1", 3);
        ledger.record_embedding(&scope(), "file_9", 1);

        let synced = ledger
            .resolve(&scope(), &ids(&["file_1", "file_2"]))
            .unwrap();
        assert_eq!(synced, HashSet::from(["file_1".to_string()]));
    }

    #[test]
    fn scopes_are_isolated() {
        let ledger = EmbeddingLedger::new();
        ledger.record_embedding(&CodebaseScope::new(1, 11, "cb"), "file_1", 1);
        ledger.record_embedding(&CodebaseScope::new(1, 10, "other"), "file_1", 1);

        let synced = ledger.resolve(&scope(), &ids(&["file_1"])).unwrap();
        assert!(synced.is_empty());
    }

    #[test]
    fn latest_attempt_wins() {
        let ledger = EmbeddingLedger::new();
        let t0 = Utc::now();
        ledger.record(&scope(), "file_1", 2, t0 + Duration::seconds(5), true);
        ledger.record(&scope(), "file_1", 2, t0, false);
        assert!(ledger.resolve(&scope(), &ids(&["file_1"])).unwrap().is_empty());

        ledger.record(&scope(), "file_1", 4, t0 + Duration::seconds(9), false);
        let latest = ledger.latest(&scope(), "file_1").unwrap();
        assert_eq!(latest.chunks, 4);
        assert_eq!(latest.scope, scope());
        assert_eq!(ledger.resolve(&scope(), &ids(&["file_1"])).unwrap().len(), 1);
    }

    #[test]
    fn ties_go_to_later_insertion() {
        let ledger = EmbeddingLedger::new();
        let t = Utc::now();
        ledger.record(&scope(), "file_1", 1, t, false);
        ledger.record(&scope(), "file_1", 0, t, true);
        assert!(ledger.latest(&scope(), "file_1").unwrap().deleted);
    }

    #[test]
    fn offline_ledger_fails_fast() {
        let ledger = EmbeddingLedger::new();
        ledger.set_available(false);
        let err = ledger.resolve(&scope(), &ids(&["file_1"])).unwrap_err();
        assert!(err.to_string().contains("offline"));

        ledger.set_available(true);
        assert!(ledger.resolve(&scope(), &ids(&["file_1"])).is_ok());
    }
}
