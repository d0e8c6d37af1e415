//! Hierarchical view over a validated node list, and structural comparison
//! between two snapshots.

use std::collections::{HashMap, HashSet};

use crate::error::TreeError;
use crate::types::ArtifactNode;
use crate::validate::{validate, validate_bounded};

/// A validated view over a borrowed node list. Children keep their
/// submission order.
#[derive(Debug, Clone)]
pub struct ArtifactTree<'a> {
    nodes: &'a [ArtifactNode],
    index: HashMap<&'a str, usize>,
    children: Vec<Vec<usize>>,
    root: usize,
}

impl<'a> ArtifactTree<'a> {
    /// Validate `nodes` and index them by id.
    pub fn build(nodes: &'a [ArtifactNode]) -> Result<Self, TreeError> {
        validate(nodes)?;
        Ok(Self::index(nodes))
    }

    /// [`Self::build`] with a node-count limit checked first.
    pub fn build_bounded(nodes: &'a [ArtifactNode], limit: usize) -> Result<Self, TreeError> {
        validate_bounded(nodes, limit)?;
        Ok(Self::index(nodes))
    }

    fn index(nodes: &'a [ArtifactNode]) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut children = vec![Vec::new(); nodes.len()];
        let mut root = 0;
        for (i, node) in nodes.iter().enumerate() {
            match &node.parent_id {
                // validate() guarantees the parent is indexed.
                Some(parent_id) => children[index[parent_id.as_str()]].push(i),
                None => root = i,
            }
        }

        Self {
            nodes,
            index,
            children,
            root,
        }
    }

    pub fn root(&self) -> &'a ArtifactNode {
        &self.nodes[self.root]
    }

    pub fn get(&self, id: &str) -> Option<&'a ArtifactNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Pre-order walk from the root, each node paired with its distance from
    /// the root.
    pub fn walk(&self) -> Vec<(usize, &'a ArtifactNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0, self.root)];
        while let Some((depth, i)) = stack.pop() {
            out.push((depth, &self.nodes[i]));
            stack.extend(self.children[i].iter().rev().map(|&c| (depth + 1, c)));
        }
        out
    }

    /// Edges on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.walk()
            .into_iter()
            .map(|(depth, _)| depth)
            .max()
            .unwrap_or(0)
    }

    /// File nodes in submission order.
    pub fn files(&self) -> impl Iterator<Item = &'a ArtifactNode> {
        self.nodes.iter().filter(|n| n.is_file())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Ids that appeared or disappeared between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeChanges {
    /// In `next` but not `prior`, in `next` order.
    pub added: Vec<String>,
    /// In `prior` but not `next`, in `prior` order.
    pub removed: Vec<String>,
}

impl TreeChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare two node lists by id.
///
/// A node that moved under a different parent keeps its id and shows up in
/// neither list.
pub fn compare(prior: &[ArtifactNode], next: &[ArtifactNode]) -> TreeChanges {
    let prior_ids: HashSet<&str> = prior.iter().map(|n| n.id.as_str()).collect();
    let next_ids: HashSet<&str> = next.iter().map(|n| n.id.as_str()).collect();

    TreeChanges {
        added: next
            .iter()
            .filter(|n| !prior_ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect(),
        removed: prior
            .iter()
            .filter(|n| !next_ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
