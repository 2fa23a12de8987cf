//! CLI command implementations

use crate::cli::Commands;
use crate::git::RepositoryStatus;
use crate::operations::{CloneOptions, GitOperations};
use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run the selected subcommand against an initialized facade
pub fn execute(ops: &GitOperations<'_>, command: &Commands) -> Result<()> {
    match command {
        Commands::Clone {
            url,
            name,
            branch,
            token,
        } => {
            let options = CloneOptions {
                target_name: name.clone(),
                branch: branch.clone(),
                token: token.clone(),
            };
            let handle = with_spinner("Cloning", || ops.clone_repository(url, &options))?;
            println!("{}", handle.path().display());
        }
        Commands::Fetch { repo } => {
            let handle = ops.open(repo)?;
            with_spinner("Fetching", || ops.fetch(&handle))?;
        }
        Commands::Pull { repo, branch } => {
            let handle = ops.open(repo)?;
            with_spinner("Pulling", || ops.pull(&handle, branch.as_deref()))?;
        }
        Commands::Push { repo, branch } => {
            let handle = ops.open(repo)?;
            with_spinner("Pushing", || ops.push(&handle, branch.as_deref()))?;
        }
        Commands::Commit { repo, message, all } => {
            let handle = ops.open(repo)?;
            let commit_id = ops.commit(&handle, message, *all)?;
            println!("{commit_id}");
        }
        Commands::Status { repo, json } => {
            let handle = ops.open(repo)?;
            let status = ops.status(&handle)?;
            if *json {
                let rendered = serde_json::to_string_pretty(&status)
                    .context("Failed to serialize status as JSON")?;
                println!("{rendered}");
            } else {
                print!("{}", render_status(&status));
            }
        }
        Commands::Branch { repo } => {
            let handle = ops.open(repo)?;
            println!("{}", ops.current_branch(&handle)?);
        }
        Commands::SetRemote { repo, url, token } => {
            let handle = ops.open(repo)?;
            ops.set_remote_url(&handle, url, token.as_deref())?;
        }
    }

    Ok(())
}

/// Human-readable status, one line per changed path
#[must_use]
pub fn render_status(status: &RepositoryStatus) -> String {
    let mut out = String::new();

    match &status.branch {
        Some(branch) => out.push_str(&format!("On branch {branch}\n")),
        None => out.push_str("HEAD detached\n"),
    }
    if let Some(upstream) = &status.upstream {
        out.push_str(&format!(
            "Tracking {upstream} (ahead {}, behind {})\n",
            status.ahead, status.behind
        ));
    }

    if status.is_clean() {
        out.push_str("Working tree clean\n");
        return out;
    }

    let sections = [
        ("Staged", &status.staged),
        ("Unstaged", &status.unstaged),
        ("Untracked", &status.untracked),
        ("Conflicted", &status.conflicted),
    ];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("{title}:\n"));
        for entry in entries {
            out.push_str(&format!("  {:?}: {}\n", entry.kind, entry.path));
        }
    }

    out
}

/// Show a spinner on stderr while a network operation runs
fn with_spinner<T>(label: &str, operation: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("{label}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = operation();
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{FileStatus, FileStatusKind};

    #[test]
    fn test_render_clean_status() {
        let status = RepositoryStatus {
            branch: Some("main".to_owned()),
            upstream: Some("origin/main".to_owned()),
            ..RepositoryStatus::default()
        };
        assert_eq!(
            render_status(&status),
            "On branch main\nTracking origin/main (ahead 0, behind 0)\nWorking tree clean\n"
        );
    }

    #[test]
    fn test_render_dirty_status() {
        let status = RepositoryStatus {
            branch: None,
            untracked: vec![FileStatus {
                path: "notes.txt".to_owned(),
                kind: FileStatusKind::Untracked,
            }],
            ..RepositoryStatus::default()
        };
        let rendered = render_status(&status);
        assert!(rendered.starts_with("HEAD detached\n"));
        assert!(rendered.contains("Untracked:\n  Untracked: notes.txt\n"));
        assert!(!rendered.contains("Staged:"));
    }
}
