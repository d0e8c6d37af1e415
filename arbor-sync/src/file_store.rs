//! File-backed tree store.
//!
//! One JSON document per key at `<data_dir>/trees/<sha256(key)>.json`. The
//! document carries its own key so a hash collision or a stray file is
//! caught on read.
//!
//! ## `replace` protocol
//!
//! 1. Take the key's in-process lock.
//! 2. Take an exclusive advisory lock on `<hash>.lock`. Every store instance
//!    and process sharing the data directory queues here.
//! 3. Read the current generation (0 if absent or undecodable).
//! 4. Serialize the next snapshot to a uniquely named temp file in `trees/`.
//! 5. Rename it over `<hash>.json` (atomic on POSIX).
//! 6. Release both locks.
//!
//! A failure before step 5 drops the temp file; the old document is intact.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use arbor_core::{ArtifactNode, SnapshotKey};

use crate::error::{io_err, StoreError};
use crate::locks::KeyLocks;
use crate::store::{TreeSnapshot, TreeStore};

#[derive(Debug)]
pub struct FileTreeStore {
    root: PathBuf,
    locks: KeyLocks,
}

impl FileTreeStore {
    /// Store rooted at `data_dir`. Directories are created on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
            locks: KeyLocks::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/trees/<hex digest>.json`. Pure, no I/O.
    pub fn snapshot_path(&self, key: &SnapshotKey) -> PathBuf {
        snapshot_path_at(&self.root, key)
    }

    fn load(&self, key: &SnapshotKey) -> Result<Option<TreeSnapshot>, StoreError> {
        let path = self.snapshot_path(key);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path, e)),
        };
        let snapshot: TreeSnapshot = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Json {
                path: path.clone(),
                source: e,
            }
        })?;
        if &snapshot.key != key {
            return Err(StoreError::KeyMismatch {
                path,
                expected: key.clone(),
                found: snapshot.key,
            });
        }
        Ok(Some(snapshot))
    }

    /// Generation to build on. A document that no longer decodes is
    /// overwritten, and numbering restarts.
    fn prior_generation(&self, key: &SnapshotKey) -> Result<u64, StoreError> {
        match self.load(key) {
            Ok(prior) => Ok(prior.map(|s| s.generation).unwrap_or(0)),
            Err(err) if err.is_corrupt() => {
                tracing::warn!(%key, error = %err, "overwriting unreadable snapshot");
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }
}

/// Path for `key` under `root`. Keys are hashed so branch names with `/` or
/// other awkward characters map to flat, fixed-length file names.
pub fn snapshot_path_at(root: &Path, key: &SnapshotKey) -> PathBuf {
    let mut hasher = Sha256::new();
    // NUL-separated so ("a", "bc") and ("ab", "c") never collide.
    for part in [
        key.scope.team.to_string(),
        key.scope.user.to_string(),
        key.scope.codebase.0.clone(),
        key.branch.0.clone(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    root.join("trees")
        .join(format!("{}.json", hex::encode(hasher.finalize())))
}

/// Exclusive advisory lock on a key's `.lock` file, released on drop. The
/// file itself is never removed.
struct KeyFileLock {
    file: File,
}

impl KeyFileLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| io_err(path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| io_err(path, e))?;
        Ok(Self { file })
    }
}

impl Drop for KeyFileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Write `snapshot` to a fresh temp file next to `path`, then rename it into
/// place. The temp file is deleted on any failure.
fn write_atomic(path: &Path, snapshot: &TreeSnapshot) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(&json).map_err(|e| io_err(&tmp_path, e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

impl TreeStore for FileTreeStore {
    fn read(&self, key: &SnapshotKey) -> Result<Option<TreeSnapshot>, StoreError> {
        self.load(key)
    }

    fn replace(
        &self,
        key: &SnapshotKey,
        nodes: &[ArtifactNode],
    ) -> Result<TreeSnapshot, StoreError> {
        self.locks.with_key(key, || {
            let path = self.snapshot_path(key);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            }
            let _file_lock = KeyFileLock::acquire(&path.with_extension("lock"))?;

            let snapshot = TreeSnapshot::next(key, self.prior_generation(key)?, nodes);
            write_atomic(&path, &snapshot)?;
            tracing::debug!(
                %key,
                generation = snapshot.generation,
                path = %path.display(),
                "snapshot written"
            );
            Ok(snapshot)
        })
    }
}
