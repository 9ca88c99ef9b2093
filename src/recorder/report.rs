//! Typed model of the analyzer's JSON output
//!
//! ESLint's `-f json` formatter emits an array of per-file results. Only the
//! fields the recorder persists are modelled; everything else is ignored.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of output bytes quoted in a parse error
const EXCERPT_LIMIT: usize = 400;

/// Result for a single analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_path: String,
    #[serde(default)]
    pub messages: Vec<LintMessage>,
}

/// One message reported for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    /// `null` for fatal parse errors
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub severity: i64,
    #[serde(default)]
    pub line: u32,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Parse analyzer stdout into per-file reports.
pub fn parse_reports(output: &[u8]) -> Result<Vec<FileReport>> {
    serde_json::from_slice(output).map_err(|e| {
        Error::ToolExecution(format!(
            "analyzer output is not a JSON report ({}); output starts with: {}",
            e,
            excerpt(output)
        ))
    })
}

/// Lossy, length-limited rendering of process output for diagnostics
pub fn excerpt(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    let text = text.trim();
    if text.is_empty() {
        return "<empty>".to_string();
    }
    match text.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
