//! The `GitOperations` facade
//!
//! Resolves repositories under a base directory and runs git against them
//! with the configured SSH key injected through `GIT_SSH_COMMAND`.

use crate::config::Settings;
use crate::error::GitOpsError;
use crate::git::{
    GitRunner, GitUrl, RepositoryHandle, RepositoryStatus, SshCredential, collect_status,
    current_branch, open_repository, resolve_path, validate_branch_name,
};
use crate::system::System;
use crate::utils::{normalize_path, validate_target_name};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for [`GitOperations::clone_repository`]
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Directory name under the base path; derived from the URL when unset
    pub target_name: Option<String>,
    /// Branch to clone instead of the remote's default
    pub branch: Option<String>,
    /// API token embedded into HTTP(S) URLs
    pub token: Option<String>,
}

impl CloneOptions {
    #[must_use]
    pub fn with_target_name<S: Into<String>>(mut self, name: S) -> Self {
        self.target_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_branch<S: Into<String>>(mut self, branch: S) -> Self {
        self.branch = Some(branch.into());
        self
    }

    #[must_use]
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Facade over git for repositories living under one base directory
///
/// Every method blocks until the underlying git invocation finishes. The
/// facade holds no locks: concurrent calls against the same repository must
/// be serialized by the caller.
pub struct GitOperations<'src> {
    system: &'src dyn System,
    base_path: PathBuf,
    credential: Option<SshCredential>,
    remote: String,
    runner: GitRunner,
}

impl<'src> GitOperations<'src> {
    /// Validate settings and prepare the base directory
    ///
    /// # Errors
    ///
    /// Returns:
    /// - A configuration error if the SSH key is missing or unreadable, or
    ///   if the base path exists but is not a directory
    /// - A filesystem error if the base directory cannot be created
    pub fn new(system: &'src dyn System, settings: &Settings) -> Result<Self> {
        let credential = settings
            .ssh_key_path
            .as_deref()
            .map(|key| SshCredential::resolve(system, key, settings.host_key_checking))
            .transpose()?;

        if settings.remote.trim().is_empty() {
            return Err(GitOpsError::configuration("Remote name cannot be empty").into());
        }

        let base_path = normalize_path(&resolve_path(system, &settings.base_path)?);

        if system.exists(&base_path) && !system.is_dir(&base_path) {
            return Err(GitOpsError::configuration(format!(
                "Base path is not a directory: '{}'",
                base_path.display()
            ))
            .into());
        }

        system.create_dir_all(&base_path).map_err(|e| {
            return GitOpsError::filesystem(format!(
                "Cannot create base directory '{}': {e}",
                base_path.display()
            ));
        })?;

        let runner = GitRunner::new(
            credential
                .as_ref()
                .map(SshCredential::git_env)
                .unwrap_or_default(),
        );

        match &credential {
            Some(cred) => debug!(
                "Using SSH key {} (StrictHostKeyChecking={})",
                cred.key_path().display(),
                cred.host_key_checking()
            ),
            None => debug!("No SSH key configured, using the default SSH setup"),
        }
        debug!("Base path: {}", base_path.display());

        Ok(Self {
            system,
            base_path,
            credential,
            remote: settings.remote.clone(),
            runner,
        })
    }

    /// Absolute directory repositories are cloned into
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&SshCredential> {
        self.credential.as_ref()
    }

    /// Remote used by fetch and push
    #[must_use]
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Handle for an existing repository under the base path
    ///
    /// # Errors
    ///
    /// Returns:
    /// - A configuration error if `name` is not a plain directory name
    /// - A filesystem error if the directory does not exist
    /// - A git operation error if it is not a repository
    pub fn open(&self, name: &str) -> Result<RepositoryHandle> {
        validate_target_name(name)?;
        let handle = RepositoryHandle::new(self.base_path.join(name));
        self.ensure_repository(&handle)?;

        let repo = open_repository(handle.path())?;
        let remote_url = repo
            .find_remote(&self.remote)
            .ok()
            .and_then(|remote| remote.url().map(str::to_owned));

        Ok(match remote_url {
            Some(url) => handle.with_remote_url(url),
            None => handle,
        })
    }

    /// Clone `url` into the base path
    ///
    /// Only the requested branch (or the remote default) is fetched.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - A configuration error for an unparseable URL or unsafe target name
    /// - A filesystem error if the target directory already exists
    /// - A git operation error if `git clone` fails
    pub fn clone_repository(&self, url: &str, options: &CloneOptions) -> Result<RepositoryHandle> {
        let parsed = GitUrl::parse(url, options.token.as_deref())?;
        let name = options.target_name.as_deref().unwrap_or(&parsed.name);
        validate_target_name(name)?;
        if let Some(branch) = options.branch.as_deref() {
            validate_branch_name(branch)?;
        }
        if self.credential.is_some() && !parsed.transport.uses_ssh() {
            debug!(
                "SSH key is not used for {:?} remote {}",
                parsed.transport,
                parsed.redacted()
            );
        }

        let repo_path = self.base_path.join(name);
        if self.system.exists(&repo_path) {
            return Err(GitOpsError::filesystem(format!(
                "Repository directory already exists: {}",
                repo_path.display()
            ))
            .into());
        }

        let target = path_str(&repo_path)?;
        let mut args = vec!["clone"];
        if let Some(branch) = options.branch.as_deref() {
            args.extend(["-b", branch]);
        }
        args.extend(["--single-branch", "--", parsed.url.as_str(), target]);

        info!("Cloning {} into {}", parsed.redacted(), repo_path.display());
        self.runner.run(&args, None)?;
        info!("Successfully cloned repository to {}", repo_path.display());

        Ok(RepositoryHandle::new(repo_path).with_remote_url(url.trim()))
    }

    /// Download objects and refs from the configured remote
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not a repository or `git fetch` fails
    pub fn fetch(&self, handle: &RepositoryHandle) -> Result<()> {
        self.ensure_repository(handle)?;
        self.git(handle, &["fetch", "--prune", "--", self.remote.as_str()])?;
        info!("Fetched {} for {}", self.remote, handle.path().display());
        Ok(())
    }

    /// Pull the latest changes, optionally switching to `branch` first
    ///
    /// # Errors
    ///
    /// Returns an error if the branch name is invalid, the handle is not a
    /// repository, the checkout fails, or `git pull` fails
    pub fn pull(&self, handle: &RepositoryHandle, branch: Option<&str>) -> Result<()> {
        if let Some(branch) = branch {
            validate_branch_name(branch)?;
        }
        self.ensure_repository(handle)?;
        if let Some(branch) = branch {
            self.checkout(handle, branch)?;
        }
        self.git(handle, &["pull"])?;
        info!(
            "Successfully pulled latest changes for {}",
            handle.path().display()
        );
        Ok(())
    }

    /// Push `branch` (or the current branch's configured push target)
    ///
    /// # Errors
    ///
    /// Returns an error if the branch name is invalid, the handle is not a
    /// repository, or `git push` fails
    pub fn push(&self, handle: &RepositoryHandle, branch: Option<&str>) -> Result<()> {
        if let Some(branch) = branch {
            validate_branch_name(branch)?;
        }
        self.ensure_repository(handle)?;
        let mut args = vec!["push", "--", self.remote.as_str()];
        if let Some(branch) = branch {
            args.push(branch);
        }
        self.git(handle, &args)?;
        info!("Pushed {} to {}", handle.path().display(), self.remote);
        Ok(())
    }

    /// Record a commit and return its id
    ///
    /// With `stage_all`, every change in the working tree (including
    /// untracked files) is staged first.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - A configuration error for an empty message
    /// - A git operation error if there is nothing to commit or git fails
    pub fn commit(
        &self,
        handle: &RepositoryHandle,
        message: &str,
        stage_all: bool,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(GitOpsError::configuration("Commit message cannot be empty").into());
        }
        self.ensure_repository(handle)?;

        if stage_all {
            self.git(handle, &["add", "-A"])?;
        }
        self.git(handle, &["commit", "-m", message])?;

        let output = self.git(handle, &["rev-parse", "HEAD"])?;
        let commit_id = output.stdout.trim().to_owned();
        info!("Committed {commit_id} in {}", handle.path().display());
        Ok(commit_id)
    }

    /// Structured summary of the working tree; no side effects
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not a repository
    pub fn status(&self, handle: &RepositoryHandle) -> Result<RepositoryStatus> {
        self.ensure_repository(handle)?;
        let repo = open_repository(handle.path())?;
        collect_status(&repo)
    }

    /// Name of the checked-out branch, `HEAD` when detached
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not a repository
    pub fn current_branch(&self, handle: &RepositoryHandle) -> Result<String> {
        self.ensure_repository(handle)?;
        let repo = open_repository(handle.path())?;
        current_branch(&repo)
    }

    /// Switch the working tree to `branch`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid branch name, or a git
    /// operation error if `git checkout` fails
    pub fn checkout(&self, handle: &RepositoryHandle, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.ensure_repository(handle)?;
        self.git(handle, &["checkout", branch, "--"])?;
        debug!("Checked out {branch} in {}", handle.path().display());
        Ok(())
    }

    /// Point the configured remote at a new URL
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the handle is not a
    /// repository, or `git remote set-url` fails
    pub fn set_remote_url(
        &self,
        handle: &RepositoryHandle,
        url: &str,
        token: Option<&str>,
    ) -> Result<()> {
        let parsed = GitUrl::parse(url, token)?;
        self.ensure_repository(handle)?;
        self.git(
            handle,
            &["remote", "set-url", "--", self.remote.as_str(), parsed.url.as_str()],
        )?;
        info!(
            "Successfully updated remote URL for {} to {}",
            handle.path().display(),
            parsed.redacted()
        );
        Ok(())
    }

    fn git(&self, handle: &RepositoryHandle, args: &[&str]) -> Result<crate::git::GitOutput> {
        self.runner.run(args, Some(handle.path()))
    }

    /// Refuse to operate on a handle whose directory is not a repository
    fn ensure_repository(&self, handle: &RepositoryHandle) -> Result<()> {
        let path = handle.path();
        if !self.system.is_dir(path) {
            return Err(GitOpsError::filesystem(format!(
                "Repository path does not exist: '{}'",
                path.display()
            ))
            .into());
        }
        if !self.system.exists(&path.join(".git")) {
            return Err(GitOpsError::git_operation(format!(
                "Not a git repository: '{}'",
                path.display()
            ))
            .into());
        }
        Ok(())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        return GitOpsError::filesystem(format!(
            "Path is not valid UTF-8: '{}'",
            path.display()
        ))
        .into();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::HostKeyChecking;
    use crate::system::MockSystem;

    fn system() -> MockSystem {
        MockSystem::new()
            .with_home("/home/dev")
            .unwrap()
            .with_current_dir("/work")
            .unwrap()
            .with_file("/home/dev/.ssh/id_ed25519", b"key")
            .unwrap()
    }

    #[test]
    fn test_new_creates_base_path() {
        let system = system();
        let settings = Settings::new("repos", Some(PathBuf::from("~/.ssh/id_ed25519")));

        let ops = GitOperations::new(&system, &settings).unwrap();

        assert_eq!(ops.base_path(), Path::new("/work/repos"));
        assert!(system.is_dir(Path::new("/work/repos")));
        assert_eq!(
            ops.credential().unwrap().key_path(),
            Path::new("/home/dev/.ssh/id_ed25519")
        );
        assert_eq!(ops.remote(), "origin");
    }

    #[test]
    fn test_new_without_key() {
        let system = system();
        let ops = GitOperations::new(&system, &Settings::new("/srv/../srv/repos", None)).unwrap();
        assert!(ops.credential().is_none());
        assert_eq!(ops.base_path(), Path::new("/srv/repos"));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let system = system();
        let settings = Settings::new("/repos", Some(PathBuf::from("/missing/key")));

        let err = GitOperations::new(&system, &settings).err().unwrap();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_configuration());
        // Key validation happens before the base path is touched
        assert!(!system.exists(Path::new("/repos")));
    }

    #[test]
    fn test_uncreatable_base_path_is_filesystem_error() {
        let system = system().with_read_only_dir("/locked").unwrap();
        let settings = Settings::new("/locked/repos", None);

        let err = GitOperations::new(&system, &settings).err().unwrap();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_filesystem());
    }

    #[test]
    fn test_base_path_that_is_a_file() {
        let system = system().with_file("/work/notes.txt", b"").unwrap();
        let err = GitOperations::new(&system, &Settings::new("notes.txt", None))
            .err()
            .unwrap();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_configuration());
    }

    #[test]
    fn test_empty_remote_rejected() {
        let system = system();
        let settings = Settings::new("/repos", None).with_remote(" ");
        assert!(GitOperations::new(&system, &settings).is_err());
    }

    #[test]
    fn test_ssh_command_injected_into_runner() {
        let system = system();
        let settings = Settings::new("/repos", Some(PathBuf::from("~/.ssh/id_ed25519")))
            .with_host_key_checking(HostKeyChecking::Yes);
        let ops = GitOperations::new(&system, &settings).unwrap();

        let env = ops.runner.env();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, "GIT_SSH_COMMAND");
        assert!(env[0].1.contains("-i '/home/dev/.ssh/id_ed25519'"));
        assert!(env[0].1.ends_with("StrictHostKeyChecking=yes"));
    }

    #[test]
    fn test_operations_on_missing_directory_fail() {
        let system = system();
        let ops = GitOperations::new(&system, &Settings::new("/repos", None)).unwrap();
        let handle = RepositoryHandle::new("/repos/never-cloned");

        for err in [
            ops.pull(&handle, None).unwrap_err(),
            ops.push(&handle, None).unwrap_err(),
            ops.fetch(&handle).unwrap_err(),
            ops.status(&handle).unwrap_err(),
        ] {
            assert!(err.downcast_ref::<GitOpsError>().unwrap().is_filesystem());
        }
    }

    #[test]
    fn test_directory_without_git_is_rejected() {
        let system = system().with_dir("/repos/plain").unwrap();
        let ops = GitOperations::new(&system, &Settings::new("/repos", None)).unwrap();

        let err = ops.open("plain").unwrap_err();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_git_operation());
    }

    #[test]
    fn test_clone_into_existing_directory_is_refused() {
        let system = system().with_dir("/repos/widgets").unwrap();
        let ops = GitOperations::new(&system, &Settings::new("/repos", None)).unwrap();

        let err = ops
            .clone_repository("git@github.com:acme/widgets.git", &CloneOptions::default())
            .unwrap_err();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_filesystem());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_clone_rejects_unsafe_target_name() {
        let system = system();
        let ops = GitOperations::new(&system, &Settings::new("/repos", None)).unwrap();

        let err = ops
            .clone_repository(
                "git@github.com:acme/widgets.git",
                &CloneOptions::default().with_target_name("../outside"),
            )
            .unwrap_err();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_configuration());
    }

    #[test]
    fn test_option_like_branch_names_rejected() {
        let system = system().with_dir("/repos/widgets/.git").unwrap();
        let ops = GitOperations::new(&system, &Settings::new("/repos", None)).unwrap();
        let handle = RepositoryHandle::new("/repos/widgets");

        for err in [
            ops.checkout(&handle, "--orphan=evil").unwrap_err(),
            ops.pull(&handle, Some("--detach")).unwrap_err(),
            ops.push(&handle, Some("--force")).unwrap_err(),
            ops.clone_repository(
                "git@github.com:acme/tools.git",
                &CloneOptions::default().with_branch("--upload-pack=touch"),
            )
            .unwrap_err(),
        ] {
            assert!(err.downcast_ref::<GitOpsError>().unwrap().is_configuration());
            assert!(err.to_string().contains("Invalid branch name"));
        }
    }

    #[test]
    fn test_empty_commit_message() {
        let system = system();
        let ops = GitOperations::new(&system, &Settings::new("/repos", None)).unwrap();
        let err = ops
            .commit(&RepositoryHandle::new("/repos/x"), "  ", true)
            .unwrap_err();
        assert!(err.downcast_ref::<GitOpsError>().unwrap().is_configuration());
    }
}
