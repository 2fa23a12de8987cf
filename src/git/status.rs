//! Read-only repository status queries backed by `git2`

use crate::error::GitOpsError;
use anyhow::Result;
use git2::{BranchType, ErrorCode, Repository, Status, StatusOptions};
use serde::Serialize;
use std::path::Path;

/// Kind of change recorded for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatusKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
    Untracked,
    Conflicted,
}

/// A single changed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub kind: FileStatusKind,
}

/// Summary of a working tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    /// Current branch, `None` when HEAD is detached
    pub branch: Option<String>,
    /// Upstream tracking branch, e.g. `origin/main`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    /// Commits on the branch not yet on the upstream
    pub ahead: usize,
    /// Commits on the upstream not yet on the branch
    pub behind: usize,
    pub staged: Vec<FileStatus>,
    pub unstaged: Vec<FileStatus>,
    pub untracked: Vec<FileStatus>,
    pub conflicted: Vec<FileStatus>,
}

impl RepositoryStatus {
    /// No staged, unstaged, untracked or conflicted paths
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
            && self.conflicted.is_empty()
    }

    /// Number of uncommitted changes across all categories
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.staged.len() + self.unstaged.len() + self.untracked.len() + self.conflicted.len()
    }
}

/// Open the repository at `path` with `git2`
///
/// # Errors
///
/// Returns a git operation error if `path` is not a git working tree
pub fn open_repository(path: &Path) -> Result<Repository> {
    Repository::open(path).map_err(|e| {
        return GitOpsError::git_operation(format!(
            "Not a git repository: '{}': {}",
            path.display(),
            e.message()
        ))
        .into();
    })
}

/// Name of the branch HEAD points at
///
/// Returns `"HEAD"` when detached. An unborn branch (fresh `git init`)
/// reports the branch HEAD will create.
///
/// # Errors
///
/// Returns a git operation error if HEAD cannot be read
pub fn current_branch(repo: &Repository) -> Result<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or("HEAD").to_owned()),
        Ok(_) => Ok("HEAD".to_owned()),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD").map_err(git_error)?;
            let target = head.symbolic_target().unwrap_or("HEAD");
            Ok(target.strip_prefix("refs/heads/").unwrap_or(target).to_owned())
        }
        Err(e) => Err(git_error(e).into()),
    }
}

/// Collect the status of the working tree at `repo`
///
/// # Errors
///
/// Returns a git operation error if the index or refs cannot be read
pub fn collect_status(repo: &Repository) -> Result<RepositoryStatus> {
    let mut status = RepositoryStatus::default();

    let branch = current_branch(repo)?;
    if branch != "HEAD" {
        status.branch = Some(branch.clone());
        fill_upstream(repo, &branch, &mut status)?;
    }

    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(true);

    let statuses = repo.statuses(Some(&mut options)).map_err(git_error)?;
    for entry in statuses.iter() {
        let path = String::from_utf8_lossy(entry.path_bytes()).into_owned();
        classify_entry(entry.status(), path, &mut status);
    }

    Ok(status)
}

fn fill_upstream(repo: &Repository, branch: &str, status: &mut RepositoryStatus) -> Result<()> {
    let Ok(local) = repo.find_branch(branch, BranchType::Local) else {
        // Unborn branch: nothing to compare
        return Ok(());
    };
    let Ok(upstream) = local.upstream() else {
        return Ok(());
    };

    status.upstream = upstream.name().ok().flatten().map(str::to_owned);

    if let (Some(local_oid), Some(upstream_oid)) = (local.get().target(), upstream.get().target()) {
        let (ahead, behind) = repo
            .graph_ahead_behind(local_oid, upstream_oid)
            .map_err(git_error)?;
        status.ahead = ahead;
        status.behind = behind;
    }

    Ok(())
}

fn classify_entry(flags: Status, path: String, status: &mut RepositoryStatus) {
    if flags.contains(Status::CONFLICTED) {
        status.conflicted.push(FileStatus {
            path,
            kind: FileStatusKind::Conflicted,
        });
        return;
    }

    if flags.contains(Status::WT_NEW) && !flags.intersects(index_flags()) {
        status.untracked.push(FileStatus {
            path,
            kind: FileStatusKind::Untracked,
        });
        return;
    }

    if let Some(kind) = index_kind(flags) {
        status.staged.push(FileStatus {
            path: path.clone(),
            kind,
        });
    }
    if let Some(kind) = worktree_kind(flags) {
        status.unstaged.push(FileStatus { path, kind });
    }
}

fn index_flags() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
}

fn index_kind(flags: Status) -> Option<FileStatusKind> {
    if flags.contains(Status::INDEX_NEW) {
        Some(FileStatusKind::Added)
    } else if flags.contains(Status::INDEX_MODIFIED) {
        Some(FileStatusKind::Modified)
    } else if flags.contains(Status::INDEX_DELETED) {
        Some(FileStatusKind::Deleted)
    } else if flags.contains(Status::INDEX_RENAMED) {
        Some(FileStatusKind::Renamed)
    } else if flags.contains(Status::INDEX_TYPECHANGE) {
        Some(FileStatusKind::TypeChange)
    } else {
        None
    }
}

fn worktree_kind(flags: Status) -> Option<FileStatusKind> {
    if flags.contains(Status::WT_MODIFIED) {
        Some(FileStatusKind::Modified)
    } else if flags.contains(Status::WT_DELETED) {
        Some(FileStatusKind::Deleted)
    } else if flags.contains(Status::WT_RENAMED) {
        Some(FileStatusKind::Renamed)
    } else if flags.contains(Status::WT_TYPECHANGE) {
        Some(FileStatusKind::TypeChange)
    } else if flags.contains(Status::WT_NEW) {
        Some(FileStatusKind::Untracked)
    } else {
        None
    }
}

fn git_error(e: git2::Error) -> GitOpsError {
    GitOpsError::git_operation(e.message().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_only() {
        let mut status = RepositoryStatus::default();
        classify_entry(Status::WT_NEW, "new.rs".to_owned(), &mut status);
        assert_eq!(status.untracked.len(), 1);
        assert_eq!(status.untracked[0].kind, FileStatusKind::Untracked);
        assert!(status.staged.is_empty());
    }

    #[test]
    fn test_staged_and_modified_again() {
        let mut status = RepositoryStatus::default();
        classify_entry(
            Status::INDEX_MODIFIED | Status::WT_MODIFIED,
            "src/lib.rs".to_owned(),
            &mut status,
        );
        assert_eq!(status.staged[0].kind, FileStatusKind::Modified);
        assert_eq!(status.unstaged[0].kind, FileStatusKind::Modified);
        assert_eq!(status.change_count(), 2);
    }

    #[test]
    fn test_added_then_deleted_in_worktree() {
        let mut status = RepositoryStatus::default();
        classify_entry(
            Status::INDEX_NEW | Status::WT_DELETED,
            "tmp.txt".to_owned(),
            &mut status,
        );
        assert_eq!(status.staged[0].kind, FileStatusKind::Added);
        assert_eq!(status.unstaged[0].kind, FileStatusKind::Deleted);
    }

    #[test]
    fn test_conflict_wins() {
        let mut status = RepositoryStatus::default();
        classify_entry(
            Status::CONFLICTED | Status::INDEX_MODIFIED,
            "merge.rs".to_owned(),
            &mut status,
        );
        assert_eq!(status.conflicted.len(), 1);
        assert!(status.staged.is_empty());
        assert!(!status.is_clean());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_path_is_kept_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt as _;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")), "x").unwrap();

        let status = collect_status(&repo).unwrap();
        assert_eq!(status.untracked.len(), 1);
        assert_eq!(status.untracked[0].path, "caf\u{fffd}.txt");
    }

    #[test]
    fn test_default_is_clean() {
        let status = RepositoryStatus::default();
        assert!(status.is_clean());
        assert_eq!(status.change_count(), 0);
    }
}
