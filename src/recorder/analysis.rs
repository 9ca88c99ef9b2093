//! Analyzer invocation

use crate::config::AnalyzerConfig;
use crate::recorder::report::{excerpt, parse_reports, FileReport};
use crate::recorder::toolchain::Toolchain;
use crate::snapshot::WorkingCopy;
use crate::{Error, Result};
use std::path::Path;

/// Run the analyzer over the whole working copy and parse its JSON report.
///
/// ESLint exits non-zero when it finds problems, so the exit status is only
/// reported; the output is parsed either way and a parse failure is the
/// only hard error.
pub fn run_analysis(
    working_copy: &WorkingCopy,
    toolchain: &Toolchain,
    config: &AnalyzerConfig,
) -> Result<Vec<FileReport>> {
    let extensions = config.extension_list();
    tracing::info!("Running {} in {}", toolchain.describe(), working_copy.path().display());

    let output = toolchain
        .command()
        .args([".", "--ext", extensions.as_str(), "-f", "json"])
        // keep .eslintrc.json authoritative on ESLint 9
        .env("ESLINT_USE_FLAT_CONFIG", "false")
        .current_dir(working_copy.path())
        .output()
        .map_err(|e| Error::Toolchain(format!("cannot run {}: {}", toolchain.describe(), e)))?;

    match parse_reports(&output.stdout) {
        Ok(mut reports) => {
            relativize(&mut reports, working_copy.path());
            if !output.status.success() {
                tracing::warn!(
                    "Analyzer exited with {} but produced a report for {} files",
                    output.status,
                    reports.len()
                );
            }
            Ok(reports)
        }
        Err(Error::ToolExecution(reason)) => Err(Error::ToolExecution(format!(
            "{}; command `{} . --ext {} -f json` exited with {}; stderr: {}",
            reason,
            toolchain.describe(),
            extensions,
            output.status,
            excerpt(&output.stderr)
        ))),
        Err(e) => Err(e),
    }
}

/// Rewrite absolute report paths under `root` as root-relative, `/`-separated paths
fn relativize(reports: &mut [FileReport], root: &Path) {
    let canonical = root.canonicalize().ok();
    for report in reports.iter_mut() {
        let path = Path::new(&report.file_path);
        let relative = path
            .strip_prefix(root)
            .ok()
            .or_else(|| canonical.as_deref().and_then(|c| path.strip_prefix(c).ok()))
            .map(|rel| rel.to_string_lossy().replace('\\', "/"));
        if let Some(relative) = relative {
            report.file_path = relative;
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::recorder::toolchain::tests::script;
    use crate::snapshot::git::tests::fixture_repo;

    #[test]
    fn test_non_zero_exit_with_report_is_accepted() {
        let (repo, _) = fixture_repo();
        let copy = WorkingCopy::existing(repo.path()).unwrap();
        let bin = tempfile::tempdir().unwrap();
        let eslint = script(
            bin.path(),
            "eslint",
            r#"echo "$@" > eslint-args.log
echo '[{"filePath":"b.ts","messages":[{"ruleId":"no-unused-vars","severity":1,"line":12}]}]'
exit 1"#,
        );

        let reports = run_analysis(&copy, &Toolchain::direct(eslint), &AnalyzerConfig::default()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].file_path, "b.ts");

        let args = std::fs::read_to_string(repo.path().join("eslint-args.log")).unwrap();
        assert_eq!(args.trim(), ". --ext .js,.jsx,.ts,.tsx -f json");
    }

    #[test]
    fn test_absolute_paths_become_relative() {
        let (repo, _) = fixture_repo();
        let copy = WorkingCopy::existing(repo.path()).unwrap();
        let bin = tempfile::tempdir().unwrap();
        let eslint = script(
            bin.path(),
            "eslint",
            r#"echo "[{\"filePath\":\"$(pwd)/src/a.ts\",\"messages\":[]},{\"filePath\":\"/elsewhere/x.js\"}]""#,
        );

        let reports = run_analysis(&copy, &Toolchain::direct(eslint), &AnalyzerConfig::default()).unwrap();
        assert_eq!(reports[0].file_path, "src/a.ts");
        assert_eq!(reports[1].file_path, "/elsewhere/x.js");
    }

    #[test]
    fn test_unparsable_output_is_tool_execution_error() {
        let (repo, _) = fixture_repo();
        let copy = WorkingCopy::existing(repo.path()).unwrap();
        let bin = tempfile::tempdir().unwrap();
        let eslint = script(
            bin.path(),
            "eslint",
            "echo 'Oops! Something went wrong!'\necho 'No ESLint configuration found' >&2\nexit 2",
        );

        let err = run_analysis(&copy, &Toolchain::direct(eslint), &AnalyzerConfig::default()).unwrap_err();
        assert_eq!(err.category(), "tool_execution");
        let text = err.to_string();
        assert!(text.contains("Oops! Something went wrong!"));
        assert!(text.contains("No ESLint configuration found"));
    }

    #[test]
    fn test_runner_prefix_is_passed() {
        let (repo, _) = fixture_repo();
        let copy = WorkingCopy::existing(repo.path()).unwrap();
        let bin = tempfile::tempdir().unwrap();
        let npx = script(bin.path(), "npx", "echo \"$1\" > runner-args.log\necho '[]'");

        let reports = run_analysis(&copy, &Toolchain::via_runner(npx), &AnalyzerConfig::default()).unwrap();
        assert!(reports.is_empty());
        let first = std::fs::read_to_string(repo.path().join("runner-args.log")).unwrap();
        assert_eq!(first.trim(), "eslint");
    }

    #[test]
    fn test_missing_program_is_toolchain_error() {
        let (repo, _) = fixture_repo();
        let copy = WorkingCopy::existing(repo.path()).unwrap();
        let err = run_analysis(&copy, &Toolchain::direct("/nonexistent/eslint"), &AnalyzerConfig::default())
            .unwrap_err();
        assert_eq!(err.category(), "toolchain");
    }
}
