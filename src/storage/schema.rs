//! Database schema definitions

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// SQL to create the commits table
///
/// Superset of both historical layouts: the analysis layout
/// (message, repo_owner, repo_name) and the history layout
/// (files_changed, insertions, deletions).
pub const CREATE_COMMITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS commits (
    hash TEXT PRIMARY KEY,
    author TEXT,
    date TEXT,
    message TEXT,
    repo_owner TEXT,
    repo_name TEXT,
    files_changed INTEGER NOT NULL DEFAULT 0,
    insertions INTEGER NOT NULL DEFAULT 0,
    deletions INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create the code_quality (findings) table
///
/// Tables from older databases lack `id` and keep the implicit rowid.
pub const CREATE_CODE_QUALITY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS code_quality (
    id INTEGER PRIMARY KEY,
    commit_hash TEXT REFERENCES commits(hash),
    tool TEXT,
    issue_type TEXT,
    severity TEXT,
    file TEXT,
    line INTEGER
)
"#;

/// Columns older databases may lack, with the definition used to add them
pub const LEGACY_COMMIT_COLUMNS: &[(&str, &str)] = &[
    ("author", "TEXT"),
    ("date", "TEXT"),
    ("message", "TEXT"),
    ("repo_owner", "TEXT"),
    ("repo_name", "TEXT"),
    ("files_changed", "INTEGER NOT NULL DEFAULT 0"),
    ("insertions", "INTEGER NOT NULL DEFAULT 0"),
    ("deletions", "INTEGER NOT NULL DEFAULT 0"),
];

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_commits_date ON commits(date)",
    "CREATE INDEX IF NOT EXISTS idx_code_quality_commit_tool ON code_quality(commit_hash, tool)",
    "CREATE INDEX IF NOT EXISTS idx_code_quality_file ON code_quality(file, line)",
];

/// Table creation statements
pub fn table_statements() -> Vec<&'static str> {
    vec![CREATE_COMMITS_TABLE, CREATE_CODE_QUALITY_TABLE]
}
