//! libgit2-backed commit inspection

use crate::commit::{ChangeStats, Commit};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Oid, Repository, Revwalk, Sort};
use std::path::Path;

/// Clone `url` into `path`
pub fn clone(url: &str, path: &Path) -> Result<()> {
    git2::build::RepoBuilder::new()
        .clone(url, path)
        .map(|_| ())
        .map_err(|e| Error::Acquisition(format!("git clone {} failed: {}", url, e.message())))
}

fn state_error(context: &str, e: git2::Error) -> Error {
    Error::RepositoryState(format!("{}: {}", context, e.message()))
}

/// Read-only view of a working copy's commit graph.
pub struct Snapshot {
    repo: Repository,
}

impl Snapshot {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)
            .map_err(|e| state_error(&format!("{} is not a git repository", path.display()), e))?;
        Ok(Self { repo })
    }

    /// Metadata of the commit HEAD points at
    pub fn head(&self) -> Result<Commit> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| state_error("cannot resolve HEAD", e))?;
        describe(&self.repo, &head)
    }

    /// Short name of the checked out branch, if HEAD is on one
    pub fn current_branch(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .filter(|head| head.is_branch())
            .and_then(|head| head.shorthand().map(|s| s.to_string()))
    }

    /// Newest-first walk of every commit reachable from `branch`.
    ///
    /// `branch` is any revision expression (`master`, `origin/main`, `HEAD`).
    pub fn history(&self, branch: &str) -> Result<History<'_>> {
        let tip = self
            .repo
            .revparse_single(branch)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| state_error(&format!("unknown branch {}", branch), e))?;

        let mut walk = self.repo.revwalk().map_err(|e| state_error("revwalk failed", e))?;
        walk.set_sorting(Sort::TIME)
            .map_err(|e| state_error("revwalk failed", e))?;
        walk.push(tip.id()).map_err(|e| state_error("revwalk failed", e))?;

        Ok(History {
            repo: &self.repo,
            walk,
        })
    }
}

/// Lazy commit history. Finite; a new walk is needed to read it again.
pub struct History<'repo> {
    repo: &'repo Repository,
    walk: Revwalk<'repo>,
}

impl Iterator for History<'_> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = match self.walk.next()? {
            Ok(oid) => oid,
            Err(e) => return Some(Err(state_error("revwalk failed", e))),
        };
        Some(describe_oid(self.repo, oid))
    }
}

fn describe_oid(repo: &Repository, oid: Oid) -> Result<Commit> {
    let commit = repo
        .find_commit(oid)
        .map_err(|e| state_error(&format!("missing commit {}", oid), e))?;
    describe(repo, &commit)
}

fn describe(repo: &Repository, commit: &git2::Commit<'_>) -> Result<Commit> {
    let author = commit.author();
    Ok(Commit {
        hash: commit.id().to_string(),
        author: author.name().unwrap_or("unknown").to_string(),
        date: to_datetime(author.when())?,
        message: commit.message().unwrap_or("").trim().to_string(),
        stats: change_stats(repo, commit)?,
    })
}

/// Diff statistics against the first parent; root commits diff against the empty tree
fn change_stats(repo: &Repository, commit: &git2::Commit<'_>) -> Result<ChangeStats> {
    let context = format!("cannot diff commit {}", commit.id());
    let tree = commit.tree().map_err(|e| state_error(&context, e))?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree().map_err(|e| state_error(&context, e))?),
        Err(_) => None,
    };

    let stats = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .and_then(|diff| diff.stats())
        .map_err(|e| state_error(&context, e))?;

    Ok(ChangeStats {
        files_changed: stats.files_changed(),
        insertions: stats.insertions(),
        deletions: stats.deletions(),
    })
}

fn to_datetime(time: git2::Time) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| Error::RepositoryState(format!("commit timestamp out of range: {}", time.seconds())))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use git2::{Signature, Time};
    use tempfile::TempDir;

    pub const T0: i64 = 1_700_000_000;

    pub fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str, time: i64) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        let mut index = repo.index().unwrap();
        for (name, contents) in files {
            let path = workdir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, contents).unwrap();
            index.add_path(Path::new(name)).unwrap();
        }
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Ada Lovelace", "ada@example.com", &Time::new(time, 120)).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap()
    }

    /// Two-commit repository; returns the directory and the HEAD id
    pub fn fixture_repo() -> (TempDir, Oid) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_files(&repo, &[("src/a.ts", "const a = 1;\n")], "Initial commit\n", T0);
        let head = commit_files(
            &repo,
            &[("src/a.ts", "const a = 2;\n"), ("src/b.ts", "let b;\nexport { b };\n")],
            "  Add b module\n\nAlso bump a.\n",
            T0 + 3600,
        );
        (dir, head)
    }

    #[test]
    fn test_head_metadata() {
        let (dir, head_id) = fixture_repo();
        let head = Snapshot::open(dir.path()).unwrap().head().unwrap();

        assert_eq!(head.hash, head_id.to_string());
        assert_eq!(head.author, "Ada Lovelace");
        assert_eq!(head.message, "Add b module\n\nAlso bump a.");
        assert_eq!(head.date.timestamp(), T0 + 3600);
        assert_eq!(head.date.offset().local_minus_utc(), 7200);
        assert_eq!(
            head.stats,
            ChangeStats { files_changed: 2, insertions: 3, deletions: 1 }
        );
    }

    #[test]
    fn test_history_is_newest_first_with_stats() {
        let (dir, head_id) = fixture_repo();
        let snapshot = Snapshot::open(dir.path()).unwrap();

        let commits: Vec<Commit> = snapshot.history("HEAD").unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, head_id.to_string());
        assert_eq!(commits[1].message, "Initial commit");
        assert_eq!(
            commits[1].stats,
            ChangeStats { files_changed: 1, insertions: 1, deletions: 0 }
        );

        // re-invocation walks again from the start
        assert_eq!(snapshot.history("HEAD").unwrap().count(), 2);
    }

    #[test]
    fn test_history_by_branch_name() {
        let (dir, _) = fixture_repo();
        let snapshot = Snapshot::open(dir.path()).unwrap();
        let branch = snapshot.current_branch().unwrap();
        assert_eq!(snapshot.history(&branch).unwrap().count(), 2);
    }

    #[test]
    fn test_unknown_branch_is_state_error() {
        let (dir, _) = fixture_repo();
        let snapshot = Snapshot::open(dir.path()).unwrap();
        let err = snapshot.history("does-not-exist").err().unwrap();
        assert_eq!(err.category(), "repository_state");
    }

    #[test]
    fn test_invalid_repository_is_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Snapshot::open(dir.path()).err().unwrap();
        assert_eq!(err.category(), "repository_state");
    }

    #[test]
    fn test_unborn_head_is_state_error() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let err = Snapshot::open(dir.path()).unwrap().head().unwrap_err();
        assert_eq!(err.category(), "repository_state");
    }
}
