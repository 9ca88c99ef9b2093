//! Analyzer toolchain discovery and setup

use crate::config::AnalyzerConfig;
use crate::recorder::report::excerpt;
use crate::snapshot::WorkingCopy;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Packages installed into the working copy before analysis
pub const ANALYZER_PACKAGES: &[&str] = &[
    "eslint",
    "@typescript-eslint/parser",
    "@typescript-eslint/eslint-plugin",
    "typescript",
    "eslint-plugin-react",
];

pub const ESLINT_CONFIG_FILE: &str = ".eslintrc.json";

/// How to launch the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl Toolchain {
    /// Launch an analyzer binary directly
    pub fn direct(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Launch the analyzer through a package runner (`npx eslint`)
    pub fn via_runner(runner: impl Into<PathBuf>) -> Self {
        Self {
            program: runner.into(),
            leading_args: vec!["eslint".to_string()],
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command with the launcher prefix applied; callers add the analyzer arguments
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.leading_args.iter().cloned());
        parts.join(" ")
    }
}

/// Make sure the analyzer can run inside `working_copy`.
///
/// Resolves the launcher, installs the analyzer packages when enabled and
/// writes the ESLint configuration to the working copy root.
pub fn ensure_toolchain(working_copy: &WorkingCopy, config: &AnalyzerConfig) -> Result<Toolchain> {
    let root = working_copy.path();

    let toolchain = match &config.analyzer_binary_path {
        Some(path) => Toolchain::direct(resolve_program(Some(path.as_path()), "eslint")?),
        None => Toolchain::via_runner(resolve_program(config.package_runner_path.as_deref(), "npx")?),
    };
    tracing::debug!("Analyzer launcher: {}", toolchain.describe());

    if config.install_dependencies {
        let npm = resolve_program(config.package_manager_path.as_deref(), "npm")?;

        if !root.join("package.json").exists() {
            tracing::info!("package.json not found in {}, initializing npm project", root.display());
            run_step(&npm, &["init", "-y"], root)?;
        }

        tracing::info!("Installing analyzer packages in {}", root.display());
        let mut args: Vec<&str> = vec!["install"];
        args.extend_from_slice(ANALYZER_PACKAGES);
        args.push("--legacy-peer-deps");
        run_step(&npm, &args, root)?;
    }

    write_eslint_config(root)?;
    Ok(toolchain)
}

/// The fixed ESLint configuration document
pub fn eslint_config() -> serde_json::Value {
    serde_json::json!({
        "parser": "@typescript-eslint/parser",
        "plugins": ["@typescript-eslint", "react"],
        "extends": [
            "eslint:recommended",
            "plugin:@typescript-eslint/recommended",
            "plugin:react/recommended"
        ],
        "settings": {
            "react": { "version": "detect" }
        },
        "rules": {
            "react/react-in-jsx-scope": "off"
        },
        "env": {
            "browser": true,
            "node": true,
            "es6": true
        }
    })
}

fn write_eslint_config(root: &Path) -> Result<()> {
    let path = root.join(ESLINT_CONFIG_FILE);
    let contents = serde_json::to_string_pretty(&eslint_config())
        .map_err(|e| Error::Toolchain(format!("cannot serialize eslint config: {}", e)))?;
    std::fs::write(&path, contents)
        .map_err(|e| Error::Toolchain(format!("cannot write {}: {}", path.display(), e)))
}

fn run_step(program: &Path, args: &[&str], cwd: &Path) -> Result<()> {
    let command_line = format!("{} {}", program.display(), args.join(" "));
    tracing::debug!("Running `{}` in {}", command_line, cwd.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::Toolchain(format!("cannot run `{}`: {}", command_line, e)))?;

    if !output.status.success() {
        return Err(Error::Toolchain(format!(
            "`{}` failed with {}: {}",
            command_line,
            output.status,
            excerpt(&output.stderr)
        )));
    }
    Ok(())
}

/// Use the configured path when given, otherwise search `PATH`
pub fn resolve_program(configured: Option<&Path>, name: &str) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::Toolchain(format!(
            "{} not found at {} (check the configured path)",
            name,
            path.display()
        )));
    }

    find_in_path(name, std::env::var_os("PATH").as_deref()).ok_or_else(|| {
        Error::Toolchain(format!("{} not found on PATH; install it or configure its location", name))
    })
}

fn find_in_path(name: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    let candidates: Vec<String> = if cfg!(windows) {
        vec![format!("{}.cmd", name), format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    };

    std::env::split_paths(path_var)
        .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
        .find(|candidate| candidate.is_file())
}
