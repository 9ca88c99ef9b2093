//! One-shot run: snapshot the repository, analyze it and record the results

use std::path::PathBuf;
use crate::commit::{Commit, RepoIdentity};
use crate::config::AnalyzerConfig;
use crate::finding::Severity;
use crate::recorder::{self, collect_source_files};
use crate::snapshot::{Destination, RepoSource, Snapshot, WorkingCopy};
use crate::storage::{RunRecord, SqliteStore};
use crate::ui::{self, Spinner};
use crate::Result;

/// Inputs of a single run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: RepoSource,
    pub identity: RepoIdentity,
    pub db_path: PathBuf,
}

impl RunRequest {
    /// Run against `github.com/<owner>/<name>` (or the configured remote base)
    pub fn github(owner: &str, name: &str, db_path: impl Into<PathBuf>) -> Self {
        Self {
            source: RepoSource::github(owner, name),
            identity: RepoIdentity::new(owner, name),
            db_path: db_path.into(),
        }
    }
}

/// What a completed run recorded
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub commit: Commit,
    pub record: RunRecord,
    /// Per-file results returned by the analyzer
    pub files_reported: usize,
    /// Files with a recognised extension found in the working copy
    pub source_files: usize,
    pub severity_counts: Vec<(Severity, usize)>,
    /// Commits upserted from history, when history recording is enabled
    pub history_commits: Option<usize>,
}

impl RunSummary {
    pub fn issue_count(&self) -> usize {
        self.severity_counts
            .iter()
            .filter(|(severity, _)| *severity != Severity::None)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Clone into a temporary directory, record, then remove the clone.
///
/// The working copy is released on every path; a failed removal is logged.
pub fn run(request: &RunRequest, config: &AnalyzerConfig) -> Result<RunSummary> {
    let spinner = Spinner::new(&format!("Cloning {}", request.identity));
    let working_copy = WorkingCopy::obtain(&request.source, Destination::Temporary, config);
    spinner.finish_and_clear();
    let working_copy = working_copy?;

    ui::info(ui::Icons::PACKAGE, "Working copy", &working_copy.path().display().to_string());
    let outcome = record(&working_copy, request, config);
    working_copy.release();
    outcome
}

/// Analyze an already obtained working copy and persist the results
pub fn record(working_copy: &WorkingCopy, request: &RunRequest, config: &AnalyzerConfig) -> Result<RunSummary> {
    let snapshot = Snapshot::open(working_copy.path())?;
    let head = snapshot.head()?;
    ui::info(ui::Icons::PERSON, "HEAD", &format!("{} {}", head.short_hash(), head.summary()));

    ui::phase("Preparing analyzer");
    let spinner = Spinner::new("Installing ESLint toolchain");
    let toolchain = recorder::ensure_toolchain(working_copy, config);
    spinner.finish_and_clear();
    let toolchain = toolchain?;

    ui::phase("Running analyzer");
    let spinner = Spinner::new(&format!("Running {}", toolchain.describe()));
    let reports = recorder::run_analysis(working_copy, &toolchain, config);
    spinner.finish_and_clear();
    let reports = reports?;

    let source_files = collect_source_files(working_copy.path(), &config.extensions).len();
    if source_files != reports.len() {
        tracing::warn!(
            "Analyzer reported {} files but {} source files were found",
            reports.len(),
            source_files
        );
    }

    let mut store = SqliteStore::open(&request.db_path)?;
    let record = recorder::persist(&mut store, &head, &reports, &request.identity)?;
    tracing::info!(
        "Recorded {} findings for {} ({} replaced)",
        record.inserted,
        head.short_hash(),
        record.replaced
    );

    let history_commits = if config.record_history {
        let branch = config
            .history_branch
            .clone()
            .or_else(|| snapshot.current_branch())
            .unwrap_or_else(|| "HEAD".to_string());
        let count = recorder::persist_history(&mut store, snapshot.history(&branch)?, &request.identity)?;
        tracing::info!("Recorded {} commits from {}", count, branch);
        Some(count)
    } else {
        None
    };

    Ok(RunSummary {
        severity_counts: store.severity_counts(&head.hash)?,
        commit: head,
        record,
        files_reported: reports.len(),
        source_files,
        history_commits,
    })
}
