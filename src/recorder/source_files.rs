//! Census of the source files the analyzer should report on

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directories the analyzer never lints
const DEFAULT_EXCLUDES: &[&str] = &["node_modules/", "bower_components/", ".git/"];

/// Files under `root` the analyzer is expected to report on.
///
/// Honors `.gitignore` and `.eslintignore`, skips hidden entries and the
/// default excludes, and keeps only the recognised extensions.
pub fn collect_source_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut overrides = OverrideBuilder::new(root);
    for pattern in DEFAULT_EXCLUDES {
        // Static patterns; a rejected one only widens the census
        overrides.add(&format!("!{}", pattern)).ok();
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .require_git(false)
        .add_custom_ignore_filename(".eslintignore");
    match overrides.build() {
        Ok(overrides) => {
            builder.overrides(overrides);
        }
        Err(e) => tracing::debug!("Ignoring default excludes: {}", e),
    }

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect();

    files.sort();
    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.') == ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_census_skips_excluded_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in [
            "src/a.ts",
            "src/view/b.jsx",
            "README.md",
            "node_modules/lib/index.js",
            ".cache/c.js",
            "generated/g.ts",
            "vendor/v.js",
        ] {
            touch(root, rel);
        }
        std::fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        std::fs::write(root.join(".eslintignore"), "vendor/\n").unwrap();

        let extensions: Vec<String> = [".js", ".jsx", ".ts", ".tsx"].iter().map(|s| s.to_string()).collect();
        let files: Vec<PathBuf> = collect_source_files(root, &extensions)
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(files, vec![PathBuf::from("src/a.ts"), PathBuf::from("src/view/b.jsx")]);
    }

    #[test]
    fn test_extension_matching() {
        let exts = vec![".ts".to_string(), "js".to_string()];
        assert!(has_extension(Path::new("a.ts"), &exts));
        assert!(has_extension(Path::new("dir/a.js"), &exts));
        assert!(!has_extension(Path::new("a.tsx"), &exts));
        assert!(!has_extension(Path::new("Makefile"), &exts));
    }
}
