//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - commits(hash, author, date, message, repo_owner, repo_name, files_changed, insertions, deletions)
//! - code_quality(commit_hash, tool, issue_type, severity, file, line)

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, RunRecord, SqliteStore, StoredCommit};
