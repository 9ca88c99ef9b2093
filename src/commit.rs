//! Commit records produced by the snapshotter and stored by the recorder

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Aggregate diff statistics of a commit against its first parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// Metadata of a single commit.
///
/// The hash is the natural identity: storing the same hash twice replaces
/// the earlier row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full hex object id
    pub hash: String,
    /// Author name
    pub author: String,
    /// Author timestamp, with the author's UTC offset
    pub date: DateTime<FixedOffset>,
    /// Commit message with surrounding whitespace trimmed
    pub message: String,
    /// Diff statistics against the first parent (or the empty tree)
    pub stats: ChangeStats,
}

impl Commit {
    /// Abbreviated hash for display
    pub fn short_hash(&self) -> &str {
        let end = self.hash.len().min(8);
        &self.hash[..end]
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Owner/name pair identifying the repository a commit belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
}

impl RepoIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
