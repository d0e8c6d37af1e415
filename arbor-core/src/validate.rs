//! Structural validation of a submitted node list.
//!
//! Checks run purely against the submitted slice, in this order:
//!
//! 1. at least one node
//! 2. unique ids
//! 3. no node is its own parent
//! 4. exactly one root
//! 5. every parent id resolves to a submitted node
//! 6. every node is reachable from the root (no detached cycles)
//!
//! The first failing check is reported.

use std::collections::{HashMap, HashSet};

use crate::error::TreeError;
use crate::types::ArtifactNode;

/// Validate that `nodes` form a single rooted tree.
pub fn validate(nodes: &[ArtifactNode]) -> Result<(), TreeError> {
    if nodes.is_empty() {
        return Err(TreeError::Empty);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(TreeError::DuplicateId {
                id: node.id.clone(),
            });
        }
    }

    if let Some(node) = nodes
        .iter()
        .find(|n| n.parent_id.as_deref() == Some(n.id.as_str()))
    {
        return Err(TreeError::SelfParent {
            id: node.id.clone(),
        });
    }

    let roots: Vec<&ArtifactNode> = nodes.iter().filter(|n| n.is_root()).collect();
    let root = match roots.as_slice() {
        [] => return Err(TreeError::MissingRoot),
        [root] => *root,
        many => {
            return Err(TreeError::MultipleRoots {
                roots: many.iter().map(|n| n.id.clone()).collect(),
            })
        }
    };

    for node in nodes {
        if let Some(parent_id) = &node.parent_id {
            if !seen.contains(parent_id.as_str()) {
                return Err(TreeError::DanglingParent {
                    id: node.id.clone(),
                    parent_id: parent_id.clone(),
                });
            }
        }
    }

    let unreachable = unreachable_from(root, nodes);
    if !unreachable.is_empty() {
        return Err(TreeError::Unreachable { ids: unreachable });
    }

    Ok(())
}

/// [`validate`], rejecting trees larger than `limit` before any structural
/// check. An empty tree is still reported as [`TreeError::Empty`].
pub fn validate_bounded(nodes: &[ArtifactNode], limit: usize) -> Result<(), TreeError> {
    if nodes.is_empty() {
        return Err(TreeError::Empty);
    }
    if nodes.len() > limit {
        return Err(TreeError::TooLarge {
            count: nodes.len(),
            limit,
        });
    }
    validate(nodes)
}

/// Ids not reachable by walking child links down from `root`, in submission
/// order. Assumes ids are unique and parents resolve.
fn unreachable_from(root: &ArtifactNode, nodes: &[ArtifactNode]) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in nodes {
        if let Some(parent_id) = &node.parent_id {
            children
                .entry(parent_id.as_str())
                .or_default()
                .push(node.id.as_str());
        }
    }

    let mut reached: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut stack = vec![root.id.as_str()];
    while let Some(id) = stack.pop() {
        if !reached.insert(id) {
            continue;
        }
        if let Some(kids) = children.get(id) {
            stack.extend(kids.iter().copied());
        }
    }

    nodes
        .iter()
        .filter(|n| !reached.contains(n.id.as_str()))
        .map(|n| n.id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
