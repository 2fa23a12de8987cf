//! Invocation of the system `git` binary

use crate::error::GitOpsError;
use crate::git::url::redact_credentials;
use anyhow::{Context as _, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Output of a successful git invocation
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub stdout: String,
}

/// Runs git with a fixed set of extra environment variables
///
/// Every invocation gets `GIT_TERMINAL_PROMPT=0` and a null stdin so a
/// missing credential fails instead of hanging on a prompt.
#[derive(Debug, Clone, Default)]
pub struct GitRunner {
    env: Vec<(String, String)>,
}

impl GitRunner {
    #[must_use]
    pub fn new(env: Vec<(String, String)>) -> Self {
        Self { env }
    }

    /// Environment variables added to every invocation
    #[must_use]
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Run `git <args>` in `cwd` and capture its output
    ///
    /// # Errors
    ///
    /// Returns a git operation error if:
    /// - The git binary cannot be spawned
    /// - git exits with a non-zero status (the error carries its stderr)
    pub fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<GitOutput> {
        let command_line = describe(args);
        debug!("Running {command_line} (cwd: {cwd:?})");

        let mut cmd = Command::new("git");
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| {
            return GitOpsError::git_operation(format!("Failed to execute {command_line}: {e}"));
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            debug!("{command_line} failed with status {}", output.status);
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(GitOpsError::git_operation(format!(
                "{command_line} failed (exit code {}): {}",
                output.status.code().unwrap_or(-1),
                redact_credentials_in(diagnostic)
            ))
            .into());
        }

        if !stderr.trim().is_empty() {
            debug!("{command_line}: {}", redact_credentials_in(stderr.trim()));
        }
        debug!("{command_line} succeeded");
        Ok(GitOutput { stdout })
    }
}

/// `git <args>` with credentials masked, for logs and error messages
fn describe(args: &[&str]) -> String {
    let mut parts = vec!["git".to_owned()];
    parts.extend(args.iter().map(|arg| redact_credentials(arg)));
    parts.join(" ")
}

fn redact_credentials_in(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let trimmed = word.trim_matches(|c| c == '\'' || c == '"');
            if trimmed.len() == word.len() {
                redact_credentials(word)
            } else {
                word.replace(trimmed, &redact_credentials(trimmed))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check that git is installed and recent enough for `GIT_SSH_COMMAND`
///
/// # Errors
///
/// Returns an error if:
/// - The git command is not found
/// - The git command failed to execute properly
/// - The git version is older than 2.3.0
#[inline]
pub fn check_git_availability() -> Result<()> {
    let output = Command::new("git")
        .args(["--version"])
        .output()
        .context("Git command not found. Please ensure Git is installed and available in PATH")?;

    if !output.status.success() {
        return Err(
            GitOpsError::git_operation("Git command failed to execute properly".to_owned()).into(),
        );
    }

    let version_output = String::from_utf8_lossy(&output.stdout);

    if let Some(version_part) = version_output.split_whitespace().nth(2)
        && let Ok(version) = parse_git_version(version_part)
        && version < (2, 3, 0)
    {
        return Err(GitOpsError::git_operation(format!(
            "Git version {version_part} is too old. keygit requires Git 2.3.0 or later for GIT_SSH_COMMAND support"
        ))
        .into());
    }

    Ok(())
}

/// Parse Git version string into tuple (major, minor, patch)
///
/// Vendor suffixes such as `2.39.3 (Apple Git-146)` or `2.43.0.windows.1`
/// are ignored.
///
/// # Errors
///
/// Returns an error if the version string is invalid
#[inline]
pub fn parse_git_version(version: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        let major = parts[0].parse().context("Invalid major version")?;
        let minor = parts[1].parse().context("Invalid minor version")?;
        let patch_digits: String = parts[2].chars().take_while(char::is_ascii_digit).collect();
        let patch = patch_digits.parse().context("Invalid patch version")?;
        Ok((major, minor, patch))
    } else {
        Err(anyhow::anyhow!("Invalid version format"))
    }
}
