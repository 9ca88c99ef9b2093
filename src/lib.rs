//! # codequality - commit and lint finding recorder
//!
//! Clones a repository, runs ESLint over its sources and records the
//! results in SQLite.
//!
//! codequality provides:
//! - A repository snapshotter (clone, HEAD and history inspection via libgit2)
//! - A quality recorder (toolchain setup, analyzer invocation, typed report parsing)
//! - SQLite-backed storage keyed by commit hash
//! - A one-shot pipeline tying the two together for the `analyze` binary

pub mod commit;
pub mod finding;
pub mod snapshot;
pub mod recorder;
pub mod storage;
pub mod pipeline;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use commit::{ChangeStats, Commit, RepoIdentity};
pub use finding::{Finding, Severity};
pub use snapshot::{Destination, RepoSource, Snapshot, WorkingCopy};
pub use storage::SqliteStore;
pub use config::AnalyzerConfig;

/// Result type alias for codequality operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for codequality operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    #[error("Invalid repository state: {0}")]
    RepositoryState(String),

    #[error("Toolchain error: {0}")]
    Toolchain(String),

    #[error("Analyzer output error: {0}")]
    ToolExecution(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable category name used in logs
    pub fn category(&self) -> &'static str {
        match self {
            Error::Acquisition(_) => "acquisition",
            Error::RepositoryState(_) => "repository_state",
            Error::Toolchain(_) => "toolchain",
            Error::ToolExecution(_) => "tool_execution",
            Error::Persistence(_) => "persistence",
            Error::Io(_) => "io",
        }
    }
}
