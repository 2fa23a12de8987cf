//! Repository handles

use crate::error::GitOpsError;
use anyhow::Result;
use git2::Branch;
use std::path::{Path, PathBuf};

/// In-process reference to a working directory on disk
///
/// A handle carries no state besides the directory it points at; every
/// operation re-checks that the directory is still a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    name: String,
    path: PathBuf,
    remote_url: Option<String>,
}

impl RepositoryHandle {
    /// Create a handle for the directory at `path`
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            remote_url: None,
        }
    }

    /// Attach the remote URL the repository was cloned from
    #[must_use]
    pub fn with_remote_url<S: Into<String>>(mut self, url: S) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Directory name under the base path
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }
}

/// Reject names git would not accept as a branch, or could parse as an option
///
/// # Errors
///
/// Returns a configuration error for an invalid branch name
pub fn validate_branch_name(name: &str) -> Result<()> {
    let valid = !name.starts_with('-') && Branch::name_is_valid(name).unwrap_or(false);
    if !valid {
        return Err(GitOpsError::configuration(format!("Invalid branch name: '{name}'")).into());
    }
    Ok(())
}
