//! Error types for arbor-sync.

use std::path::PathBuf;

use thiserror::Error;

use arbor_core::{SnapshotKey, TreeError};

/// The synced-artifact lookup could not answer.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// Tree store read or write failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot document could not be encoded or decoded.
    #[error("snapshot JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot document was found under another key's path.
    #[error("snapshot at {path} belongs to {found}, expected {expected}")]
    KeyMismatch {
        path: PathBuf,
        expected: SnapshotKey,
        found: SnapshotKey,
    },

    /// Backend refused the operation.
    #[error("tree store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// The stored document exists but cannot be used: it does not decode, or
    /// it belongs to another key. Retrying the read will not change that.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Json { .. } | StoreError::KeyMismatch { .. })
    }
}

/// Config file load/save failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// All errors a sync can surface to its caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The submitted tree is malformed; nothing was written.
    #[error(transparent)]
    MalformedTree(#[from] TreeError),

    /// Synced-artifact lookup failed; nothing was written.
    #[error(transparent)]
    ResolverUnavailable(#[from] ResolverError),

    /// The prior snapshot could not be read; nothing was written.
    #[error("failed to read tree snapshot: {0}")]
    StoreRead(#[source] StoreError),

    /// The replacement did not commit; the prior snapshot is still current.
    #[error("failed to write tree snapshot: {0}")]
    StoreWrite(#[source] StoreError),
}

impl SyncError {
    /// Whether resubmitting the same tree may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::MalformedTree(_))
    }

    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::MalformedTree(_) => "malformed_tree",
            SyncError::ResolverUnavailable(_) => "resolver_unavailable",
            SyncError::StoreRead(_) => "store_read",
            SyncError::StoreWrite(_) => "store_write",
        }
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
