use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CODEQUALITY_CONFIG";
pub const ANALYZER_ENV: &str = "CODEQUALITY_ANALYZER";
pub const PACKAGE_RUNNER_ENV: &str = "CODEQUALITY_PACKAGE_RUNNER";
pub const PACKAGE_MANAGER_ENV: &str = "CODEQUALITY_PACKAGE_MANAGER";

/// Settings for locating and driving the analyzer toolchain.
///
/// Every field has a default, so an absent or partial `codequality.toml`
/// is valid. Unset tool paths are resolved through `PATH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Run this ESLint binary directly instead of `<runner> eslint`
    pub analyzer_binary_path: Option<PathBuf>,
    /// Package runner used to launch the analyzer (npx)
    pub package_runner_path: Option<PathBuf>,
    /// Package manager used to install the analyzer (npm)
    pub package_manager_path: Option<PathBuf>,
    /// Base URL that `<owner>/<repo>` coordinates are cloned from
    pub remote_base: String,
    /// Source extensions handed to the analyzer, with leading dots
    pub extensions: Vec<String>,
    pub install_dependencies: bool,
    /// Also upsert every commit reachable from `history_branch`
    pub record_history: bool,
    pub history_branch: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            analyzer_binary_path: None,
            package_runner_path: None,
            package_manager_path: None,
            remote_base: "https://github.com".to_string(),
            extensions: [".js", ".jsx", ".ts", ".tsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            install_dependencies: true,
            record_history: false,
            history_branch: None,
        }
    }
}

impl AnalyzerConfig {
    /// Clone URL for GitHub-style coordinates
    pub fn remote_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{}/{}.git", self.remote_base.trim_end_matches('/'), owner, repo)
    }

    /// Extensions joined the way `eslint --ext` expects them
    pub fn extension_list(&self) -> String {
        self.extensions.join(",")
    }

    /// Apply `CODEQUALITY_*` tool path overrides from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var_os(key));
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<std::ffi::OsString>) {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(path) = read(ANALYZER_ENV) {
            self.analyzer_binary_path = Some(path);
        }
        if let Some(path) = read(PACKAGE_RUNNER_ENV) {
            self.package_runner_path = Some(path);
        }
        if let Some(path) = read(PACKAGE_MANAGER_ENV) {
            self.package_manager_path = Some(path);
        }
    }
}

pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("codequality.toml"))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AnalyzerConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AnalyzerConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Config file (if any) with environment overrides applied on top
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<AnalyzerConfig> {
    let mut config = load_config(path)?.unwrap_or_default();
    config.apply_env();
    Ok(config)
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codequality.toml");
        std::fs::write(
            &path,
            "package_runner_path = \"/opt/node/bin/npx\"\nrecord_history = true\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.package_runner_path, Some(PathBuf::from("/opt/node/bin/npx")));
        assert!(config.record_history);
        assert!(config.install_dependencies);
        assert_eq!(config.extension_list(), ".js,.jsx,.ts,.tsx");
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codequality.toml");
        std::fs::write(&path, "record_history = \"maybe\"").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, OsString> = [
            (ANALYZER_ENV, OsString::from("/usr/local/bin/eslint")),
            (PACKAGE_MANAGER_ENV, OsString::new()),
        ]
        .into_iter()
        .collect();

        let mut config = AnalyzerConfig {
            package_manager_path: Some(PathBuf::from("/usr/bin/npm")),
            ..AnalyzerConfig::default()
        };
        config.apply_overrides(|key| env.get(key).cloned());

        assert_eq!(config.analyzer_binary_path, Some(PathBuf::from("/usr/local/bin/eslint")));
        // empty values do not clear configured paths
        assert_eq!(config.package_manager_path, Some(PathBuf::from("/usr/bin/npm")));
        assert_eq!(config.package_runner_path, None);
    }

    #[test]
    fn test_remote_url() {
        let config = AnalyzerConfig {
            remote_base: "https://git.example.com/".to_string(),
            ..AnalyzerConfig::default()
        };
        assert_eq!(config.remote_url("acme", "web"), "https://git.example.com/acme/web.git");
        assert_eq!(
            AnalyzerConfig::default().remote_url("acme", "web"),
            "https://github.com/acme/web.git"
        );
    }
}
