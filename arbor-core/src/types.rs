//! Domain types for codebase catalog trees.
//!
//! A tree is submitted as a flat list of [`ArtifactNode`]s. Parent links are
//! by id; the hierarchical view lives in [`crate::tree`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Numeric identifier of the team that owns a codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for TeamId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Numeric identifier of the user whose working copy is being synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A strongly-typed codebase identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodebaseId(pub String);

impl fmt::Display for CodebaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CodebaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CodebaseId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed VCS branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchName(pub String);

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BranchName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BranchName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

/// Team/user/codebase triple. Embeddings are looked up at this scope; they
/// are shared by every branch of the codebase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodebaseScope {
    pub team: TeamId,
    pub user: UserId,
    pub codebase: CodebaseId,
}

impl CodebaseScope {
    pub fn new(team: i64, user: i64, codebase: impl Into<CodebaseId>) -> Self {
        Self {
            team: TeamId(team),
            user: UserId(user),
            codebase: codebase.into(),
        }
    }

    /// Narrow this scope to a single branch.
    pub fn branch(&self, branch: impl Into<BranchName>) -> SnapshotKey {
        SnapshotKey {
            scope: self.clone(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for CodebaseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team={} user={} codebase={}", self.team, self.user, self.codebase)
    }
}

/// Key of a persisted tree snapshot: one per (team, user, codebase, branch).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub scope: CodebaseScope,
    pub branch: BranchName,
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} branch={}", self.scope, self.branch)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Whether a node is a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    #[serde(rename = "dir")]
    Directory,
    #[serde(rename = "file")]
    File,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Directory => write!(f, "dir"),
            ArtifactKind::File => write!(f, "file"),
        }
    }
}

/// A node of a submitted codebase tree.
///
/// `synced` is the client's own claim that the file's embedding is current.
/// It is carried for display only and never decides what gets re-embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub synced: bool,
}

impl ArtifactNode {
    /// A directory node.
    pub fn dir(id: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind: ArtifactKind::Directory,
            parent_id: parent_id.map(str::to_owned),
            synced: false,
        }
    }

    /// A file node.
    pub fn file(id: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind: ArtifactKind::File,
            parent_id: parent_id.map(str::to_owned),
            synced: false,
        }
    }

    pub fn with_synced(mut self, synced: bool) -> Self {
        self.synced = synced;
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind == ArtifactKind::File
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
