//! Repository Snapshotter - working copies and commit metadata
//!
//! A [`WorkingCopy`] is acquired from a [`RepoSource`] and passed explicitly
//! to every later step. Temporary checkouts are removed when the handle is
//! released or dropped.

pub mod git;

pub use git::{History, Snapshot};

use crate::config::AnalyzerConfig;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Where a working copy comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    /// `<owner>/<name>` on the configured remote base
    GitHub { owner: String, name: String },
    /// Any URL (or path) libgit2 can clone from
    Url(String),
    /// An existing checkout used in place
    Local(PathBuf),
}

impl RepoSource {
    pub fn github(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoSource::GitHub {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Where a cloned working copy is placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Fresh temporary directory owned by the working copy
    Temporary,
    /// Caller-provided directory; must be empty or absent
    At(PathBuf),
}

/// A local checkout owned (or borrowed) by a single run.
#[derive(Debug)]
pub struct WorkingCopy {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl WorkingCopy {
    /// Obtain a working copy, cloning when the source is remote
    pub fn obtain(source: &RepoSource, destination: Destination, config: &AnalyzerConfig) -> Result<Self> {
        let url = match source {
            RepoSource::Local(path) => return Self::existing(path),
            RepoSource::GitHub { owner, name } => config.remote_url(owner, name),
            RepoSource::Url(url) => url.clone(),
        };

        let (path, temp) = match destination {
            Destination::Temporary => {
                let temp = tempfile::Builder::new()
                    .prefix("codequality-")
                    .tempdir()
                    .map_err(|e| Error::Acquisition(format!("could not create temporary directory: {}", e)))?;
                (temp.path().to_path_buf(), Some(temp))
            }
            Destination::At(path) => {
                std::fs::create_dir_all(&path).map_err(|e| {
                    Error::Acquisition(format!("destination {} is not writable: {}", path.display(), e))
                })?;
                (path, None)
            }
        };

        tracing::info!("Cloning {} into {}", url, path.display());
        git::clone(&url, &path)?;

        Ok(Self { path, temp })
    }

    /// Use an existing checkout in place; it is never removed
    pub fn existing(path: &Path) -> Result<Self> {
        git2::Repository::open(path).map_err(|e| {
            Error::Acquisition(format!("{} is not a git repository: {}", path.display(), e.message()))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            temp: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Remove the temporary checkout, logging instead of failing
    pub fn release(self) {
        let Some(temp) = self.temp else {
            return;
        };
        let path = temp.path().to_path_buf();
        match temp.close() {
            Ok(()) => tracing::debug!("Removed working copy {}", path.display()),
            Err(e) => tracing::warn!(
                "Could not remove temporary directory {}: {} (remove it manually)",
                path.display(),
                e
            ),
        }
    }
}
