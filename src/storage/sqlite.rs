//! SQLite storage implementation

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, OptionalExtension};
use crate::commit::{ChangeStats, Commit, RepoIdentity};
use crate::finding::{Finding, Severity, UNKNOWN_RULE};
use crate::Result;
use super::schema;

/// SQLite-backed storage for commits and findings
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema, upgrading databases written by older tools
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self.conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < schema::SCHEMA_VERSION {
            for stmt in schema::table_statements() {
                self.conn.execute(stmt, [])?;
            }
            self.add_missing_commit_columns()?;
            self.conn.pragma_update(None, "user_version", schema::SCHEMA_VERSION)?;
        }

        for stmt in schema::CREATE_INDEXES {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn add_missing_commit_columns(&self) -> Result<()> {
        let existing = self.column_names("commits")?;
        for (column, definition) in schema::LEGACY_COMMIT_COLUMNS {
            if !existing.contains(*column) {
                tracing::info!("Adding missing column commits.{}", column);
                self.conn.execute(
                    &format!("ALTER TABLE commits ADD COLUMN {} {}", column, definition),
                    [],
                )?;
            }
        }
        Ok(())
    }

    fn column_names(&self, table: &str) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(names)
    }

    // ========== Commit Operations ==========

    /// Insert a commit or replace the stored values for its hash
    pub fn upsert_commit(&self, commit: &Commit, identity: &RepoIdentity) -> Result<()> {
        upsert_commit_on(&self.conn, commit, identity)
    }

    /// Upsert a sequence of commits in one transaction; any error rolls back the batch
    pub fn upsert_commits<I>(&mut self, commits: I, identity: &RepoIdentity) -> Result<usize>
    where
        I: IntoIterator<Item = Result<Commit>>,
    {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for commit in commits {
            upsert_commit_on(&tx, &commit?, identity)?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    /// Get a commit by hash
    pub fn get_commit(&self, hash: &str) -> Result<Option<StoredCommit>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM commits WHERE hash = ?1", COMMIT_FIELDS),
                [hash],
                row_to_commit,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Most recent commits by date, newest first
    pub fn recent_commits(&self, limit: usize) -> Result<Vec<StoredCommit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM commits ORDER BY date DESC LIMIT ?1",
            COMMIT_FIELDS
        ))?;

        let commits = stmt
            .query_map([limit as i64], row_to_commit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(commits)
    }

    /// Count all commits
    pub fn count_commits(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM commits", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Finding Operations ==========

    /// Record one analysis run atomically.
    ///
    /// Upserts the commit, drops earlier findings for `(commit, tool)` and
    /// inserts `findings`.
    pub fn record_run(
        &mut self,
        commit: &Commit,
        identity: &RepoIdentity,
        tool: &str,
        findings: &[Finding],
    ) -> Result<RunRecord> {
        let tx = self.conn.transaction()?;

        upsert_commit_on(&tx, commit, identity)?;

        let replaced = tx.execute(
            "DELETE FROM code_quality WHERE commit_hash = ?1 AND tool = ?2",
            params![commit.hash, tool],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO code_quality (commit_hash, tool, issue_type, severity, file, line)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for finding in findings {
                stmt.execute(params![
                    commit.hash,
                    tool,
                    finding.issue_type,
                    finding.severity.as_str(),
                    finding.file,
                    finding.line,
                ])?;
            }
        }

        tx.commit()?;

        if replaced > 0 {
            tracing::debug!("Replaced {} earlier {} findings for {}", replaced, tool, commit.short_hash());
        }

        Ok(RunRecord {
            commit_hash: commit.hash.clone(),
            inserted: findings.len(),
            replaced,
        })
    }

    /// All findings ordered by file and line
    pub fn findings(&self) -> Result<Vec<Finding>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM code_quality ORDER BY file, line",
            FINDING_FIELDS
        ))?;

        let findings = stmt
            .query_map([], row_to_finding)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(findings)
    }

    /// Findings recorded for one commit, ordered by file and line
    pub fn findings_for_commit(&self, hash: &str) -> Result<Vec<Finding>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM code_quality WHERE commit_hash = ?1 ORDER BY file, line",
            FINDING_FIELDS
        ))?;

        let findings = stmt
            .query_map([hash], row_to_finding)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(findings)
    }

    /// Number of findings per severity for one commit, highest severity first
    pub fn severity_counts(&self, hash: &str) -> Result<Vec<(Severity, usize)>> {
        let mut stmt = self.conn.prepare(
            "SELECT severity, COUNT(*) FROM code_quality WHERE commit_hash = ?1 GROUP BY severity",
        )?;

        let rows = stmt
            .query_map([hash], |row| {
                let count: i64 = row.get(1)?;
                Ok((severity_from_value(0, row.get(0)?)?, count as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // legacy rows may store the same severity as a number and as a name
        let mut merged: BTreeMap<Severity, usize> = BTreeMap::new();
        for (severity, count) in rows {
            *merged.entry(severity).or_default() += count;
        }
        Ok(merged.into_iter().rev().collect())
    }

    /// Count all findings
    pub fn count_findings(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM code_quality", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let files: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT file) FROM code_quality",
            [],
            |row| row.get(0),
        )?;
        Ok(DbStats {
            commits: self.count_commits()?,
            findings: self.count_findings()?,
            files: files as usize,
        })
    }
}

const COMMIT_FIELDS: &str =
    "hash, author, date, message, repo_owner, repo_name, files_changed, insertions, deletions";

const FINDING_FIELDS: &str = "commit_hash, tool, issue_type, severity, file, line";

fn upsert_commit_on(conn: &Connection, commit: &Commit, identity: &RepoIdentity) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO commits (hash, author, date, message, repo_owner, repo_name, files_changed, insertions, deletions)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(hash) DO UPDATE SET
            author = excluded.author,
            date = excluded.date,
            message = excluded.message,
            repo_owner = excluded.repo_owner,
            repo_name = excluded.repo_name,
            files_changed = excluded.files_changed,
            insertions = excluded.insertions,
            deletions = excluded.deletions
        "#,
        params![
            commit.hash,
            commit.author,
            format_date(&commit.date),
            commit.message,
            identity.owner,
            identity.name,
            commit.stats.files_changed as i64,
            commit.stats.insertions as i64,
            commit.stats.deletions as i64,
        ],
    )?;
    Ok(())
}

/// Dates are stored as UTC RFC 3339 so that text order is time order
fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn conversion_error(column: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

/// Severity as stored: a name, or the analyzer's numeric level written by older tools
fn severity_from_value(column: usize, value: Value) -> rusqlite::Result<Severity> {
    match value {
        Value::Text(text) => match text.trim().parse::<i64>() {
            Ok(level) => Ok(Severity::from_level(level)),
            Err(_) => text.parse().map_err(|e| conversion_error(column, e)),
        },
        Value::Integer(level) => Ok(Severity::from_level(level)),
        Value::Real(level) => Ok(Severity::from_level(level as i64)),
        Value::Null => Ok(Severity::Low),
        Value::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            column,
            "severity".to_string(),
            Type::Blob,
        )),
    }
}

fn row_to_commit(row: &rusqlite::Row) -> rusqlite::Result<StoredCommit> {
    let date: Option<String> = row.get(2)?;
    let date = match date {
        Some(text) => DateTime::parse_from_rfc3339(&text).map_err(|e| conversion_error(2, e))?,
        None => DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
    };

    let commit = Commit {
        hash: row.get(0)?,
        author: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        date,
        message: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        stats: ChangeStats {
            files_changed: row.get::<_, Option<i64>>(6)?.unwrap_or(0) as usize,
            insertions: row.get::<_, Option<i64>>(7)?.unwrap_or(0) as usize,
            deletions: row.get::<_, Option<i64>>(8)?.unwrap_or(0) as usize,
        },
    };
    let identity = RepoIdentity {
        owner: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    };

    Ok(StoredCommit { commit, identity })
}

fn row_to_finding(row: &rusqlite::Row) -> rusqlite::Result<Finding> {
    Ok(Finding {
        commit_hash: row.get(0)?,
        tool: row.get(1)?,
        issue_type: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| UNKNOWN_RULE.to_string()),
        severity: severity_from_value(3, row.get(3)?)?,
        file: row.get(4)?,
        line: row.get::<_, Option<u32>>(5)?.unwrap_or(0),
    })
}

/// A commit row together with the repository it was recorded for
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCommit {
    pub commit: Commit,
    pub identity: RepoIdentity,
}

/// Outcome of [`SqliteStore::record_run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub commit_hash: String,
    /// Rows written by this run
    pub inserted: usize,
    /// Rows from earlier runs that were removed
    pub replaced: usize,
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub commits: usize,
    pub findings: usize,
    pub files: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Commits: {}", self.commits)?;
        writeln!(f, "  Findings: {}", self.findings)?;
        writeln!(f, "  Files: {}", self.files)
    }
}
