//! Error types for arbor-core.

use thiserror::Error;

/// A submitted node list is not a single rooted tree.
///
/// Never retryable: the client has to send a corrected tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// No nodes at all.
    #[error("malformed tree: tree must have at least one node")]
    Empty,

    /// More nodes than the configured limit.
    #[error("malformed tree: {count} nodes exceeds the limit of {limit}")]
    TooLarge { count: usize, limit: usize },

    /// Two nodes share an id.
    #[error("malformed tree: duplicate node id {id:?}")]
    DuplicateId { id: String },

    /// A node names itself as its parent.
    #[error("malformed tree: node {id:?} is its own parent")]
    SelfParent { id: String },

    /// Every node has a parent.
    #[error("malformed tree: tree must have a root node")]
    MissingRoot,

    /// More than one node has no parent.
    #[error("malformed tree: expected one root, found {}: {}", .roots.len(), .roots.join(", "))]
    MultipleRoots { roots: Vec<String> },

    /// A parent id that is not in the submitted set.
    #[error("malformed tree: node {id:?} references unknown parent {parent_id:?}")]
    DanglingParent { id: String, parent_id: String },

    /// Nodes that cannot be reached from the root, i.e. a detached parent cycle.
    #[error("malformed tree: {} node(s) unreachable from the root: {}", .ids.len(), .ids.join(", "))]
    Unreachable { ids: Vec<String> },
}
