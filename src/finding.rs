//! Findings - one reported issue (or the absence of issues) per file and line
//!
//! Findings are derived from the analyzer's per-file reports:
//! - a file with no messages yields a single `no_issues` sentinel row
//! - a file with k messages yields k rows, one per message

use crate::recorder::report::FileReport;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Issue type recorded for a file that was analyzed and had no messages
pub const NO_ISSUES: &str = "no_issues";

/// Issue type recorded when the analyzer reports a message without a rule id
pub const UNKNOWN_RULE: &str = "unknown";

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Sentinel severity for files without issues
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Map an ESLint numeric level: 2 is high, 1 is medium, everything else low
    pub fn from_level(level: i64) -> Self {
        match level {
            2 => Severity::High,
            1 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn all() -> &'static [Severity] {
        &[Severity::High, Severity::Medium, Severity::Low, Severity::None]
    }
}

/// A severity name that is not one of `none`, `low`, `medium`, `high`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored finding row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub commit_hash: String,
    /// Name of the analysis tool
    pub tool: String,
    /// Rule identifier, or [`NO_ISSUES`]
    pub issue_type: String,
    pub severity: Severity,
    /// File path as reported by the analyzer
    pub file: String,
    /// 1-based line, 0 when not applicable
    pub line: u32,
}

impl Finding {
    /// Sentinel row for a file that was analyzed and had zero issues
    pub fn no_issues(commit_hash: &str, tool: &str, file: &str) -> Self {
        Self {
            commit_hash: commit_hash.to_string(),
            tool: tool.to_string(),
            issue_type: NO_ISSUES.to_string(),
            severity: Severity::None,
            file: file.to_string(),
            line: 0,
        }
    }

    /// Expand one per-file report into the rows it persists as
    pub fn from_report(commit_hash: &str, tool: &str, report: &FileReport) -> Vec<Finding> {
        if report.messages.is_empty() {
            return vec![Finding::no_issues(commit_hash, tool, &report.file_path)];
        }

        report
            .messages
            .iter()
            .map(|message| Finding {
                commit_hash: commit_hash.to_string(),
                tool: tool.to_string(),
                issue_type: message
                    .rule_id
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_RULE.to_string()),
                severity: Severity::from_level(message.severity),
                file: report.file_path.clone(),
                line: message.line,
            })
            .collect()
    }

    pub fn is_sentinel(&self) -> bool {
        self.issue_type == NO_ISSUES
    }
}
