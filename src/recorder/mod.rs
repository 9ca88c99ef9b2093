//! Quality Recorder - run the analyzer and record its findings
//!
//! Steps, each taking the working copy explicitly:
//! - [`ensure_toolchain`]: locate/install ESLint and write its configuration
//! - [`run_analysis`]: invoke it and parse the typed JSON report
//! - [`persist`]: store the commit and its findings in one transaction

pub mod analysis;
pub mod report;
pub mod source_files;
pub mod toolchain;

pub use analysis::run_analysis;
pub use report::{FileReport, LintMessage};
pub use source_files::collect_source_files;
pub use toolchain::{ensure_toolchain, Toolchain};

use crate::commit::{Commit, RepoIdentity};
use crate::finding::Finding;
use crate::storage::{RunRecord, SqliteStore};
use crate::Result;

/// Tool name stored with every finding
pub const TOOL_NAME: &str = "eslint";

/// Upsert `commit` and replace its findings with rows derived from `reports`
pub fn persist(
    store: &mut SqliteStore,
    commit: &Commit,
    reports: &[FileReport],
    identity: &RepoIdentity,
) -> Result<RunRecord> {
    let findings: Vec<Finding> = reports
        .iter()
        .flat_map(|report| Finding::from_report(&commit.hash, TOOL_NAME, report))
        .collect();

    store.record_run(commit, identity, TOOL_NAME, &findings)
}

/// Upsert every commit of a history walk in one transaction
pub fn persist_history<I>(store: &mut SqliteStore, commits: I, identity: &RepoIdentity) -> Result<usize>
where
    I: IntoIterator<Item = Result<Commit>>,
{
    store.upsert_commits(commits, identity)
}
