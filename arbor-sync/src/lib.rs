//! # arbor-sync
//!
//! Tree reconciliation for incremental codebase embedding.
//!
//! [`SyncCoordinator::sync`] validates a client's tree, asks a
//! [`SyncedArtifactResolver`] which files are already embedded, returns the
//! ones that are not, and atomically replaces the stored snapshot.

pub mod config;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod file_store;
pub mod locks;
pub mod resolver;
pub mod store;

pub use config::{StoreBackend, SyncConfig};
pub use coordinator::{SyncCoordinator, SyncReport, SyncRequest};
pub use error::{ConfigError, ResolverError, StoreError, SyncError};
pub use file_store::FileTreeStore;
pub use resolver::{EmbeddingLedger, EmbeddingRecord, SyncedArtifactResolver};
pub use store::{ConfiguredStore, MemoryTreeStore, StoredNode, TreeSnapshot, TreeStore};
