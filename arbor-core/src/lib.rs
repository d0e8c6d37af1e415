//! Arbor core library — catalog tree types, validation, errors.
//!
//! - [`types`] — newtype ids, scopes and [`ArtifactNode`]
//! - [`validate`] — rooted-tree checks on a submitted node list
//! - [`tree`] — hierarchical view and snapshot comparison
//! - [`error`] — [`TreeError`]

pub mod error;
pub mod tree;
pub mod types;
pub mod validate;

pub use error::TreeError;
pub use tree::{compare, ArtifactTree, TreeChanges};
pub use types::{
    ArtifactKind, ArtifactNode, BranchName, CodebaseId, CodebaseScope, SnapshotKey, TeamId,
    UserId,
};
pub use validate::{validate, validate_bounded};
