#![cfg(unix)]

use codequality::storage::SqliteStore;
use git2::{Repository, Signature, Time};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Repository at `<root>/<owner>/<name>.git` with one commit
fn remote_repo(root: &Path, owner: &str, name: &str) -> String {
    let path = root.join(owner).join(format!("{}.git", name));
    let repo = Repository::init(&path).unwrap();
    std::fs::create_dir_all(path.join("src")).unwrap();
    std::fs::write(path.join("src/index.js"), "var unused = 1;\n").unwrap();
    std::fs::write(path.join("src/clean.ts"), "export const x = 1;\n").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("src/index.js")).unwrap();
    index.add_path(Path::new("src/clean.ts")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::new("Grace Hopper", "grace@example.com", &Time::new(1_700_000_000, 0)).unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "Add sources", &tree, &[])
        .unwrap()
        .to_string()
}

fn fake_eslint(dir: &Path) -> PathBuf {
    let path = dir.join("eslint");
    let report = r#"[{"filePath":"src/clean.ts","messages":[]},{"filePath":"src/index.js","messages":[{"ruleId":"no-unused-vars","severity":2,"line":1}]}]"#;
    std::fs::write(&path, format!("#!/bin/sh\necho '{}'\nexit 1\n", report)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_analyze_records_head_commit_and_findings() {
    let remotes = tempfile::tempdir().unwrap();
    let workdir = tempfile::tempdir().unwrap();
    let head = remote_repo(remotes.path(), "acme", "web");
    let eslint = fake_eslint(workdir.path());

    std::fs::write(
        workdir.path().join("codequality.toml"),
        format!(
            "remote_base = \"{}\"\ninstall_dependencies = false\n",
            remotes.path().display()
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_analyze"))
        .args(["acme", "web", "data/code_quality.db"])
        .current_dir(workdir.path())
        .env("CODEQUALITY_ANALYZER", &eslint)
        .env("CODEQUALITY_QUIET", "1")
        .env_remove("CODEQUALITY_CONFIG")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let store = SqliteStore::open(&workdir.path().join("data/code_quality.db")).unwrap();
    let stored = store.get_commit(&head).unwrap().unwrap();
    assert_eq!(stored.commit.author, "Grace Hopper");
    assert_eq!(stored.commit.message, "Add sources");
    assert_eq!(stored.identity.owner, "acme");
    assert_eq!(stored.identity.name, "web");

    let findings = store.findings_for_commit(&head).unwrap();
    let rows: Vec<(&str, &str, &str, u32)> = findings
        .iter()
        .map(|f| (f.issue_type.as_str(), f.severity.as_str(), f.file.as_str(), f.line))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("no_issues", "none", "src/clean.ts", 0),
            ("no-unused-vars", "high", "src/index.js", 1),
        ]
    );
}

#[test]
fn test_unreachable_remote_exits_with_failure() {
    let remotes = tempfile::tempdir().unwrap();
    let workdir = tempfile::tempdir().unwrap();
    std::fs::write(
        workdir.path().join("codequality.toml"),
        format!("remote_base = \"{}\"\n", remotes.path().display()),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_analyze"))
        .args(["acme", "missing", "code_quality.db"])
        .current_dir(workdir.path())
        .env_remove("CODEQUALITY_CONFIG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("acquisition"));
    assert!(!workdir.path().join("code_quality.db").exists());
}
