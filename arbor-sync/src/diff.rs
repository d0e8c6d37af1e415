//! Diverging-node computation.
//!
//! A file node diverges iff its id is not in the resolver's synced set.
//! Directories never diverge. The client's `synced` flag is ignored, and so
//! is the node's position in the tree: moving or renaming an ancestor
//! directory does not change a file's id, so it does not force a re-embed.

use std::collections::HashSet;

use arbor_core::ArtifactNode;

/// Ids of file nodes in `nodes` that are missing from `known_synced`.
///
/// Order follows `nodes`; each id appears at most once.
pub fn diff<'a, I>(nodes: I, known_synced: &HashSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a ArtifactNode>,
{
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut diverging = Vec::new();
    for node in nodes {
        if !node.is_file() || known_synced.contains(&node.id) {
            continue;
        }
        if emitted.insert(node.id.as_str()) {
            diverging.push(node.id.clone());
        }
    }
    diverging
}
