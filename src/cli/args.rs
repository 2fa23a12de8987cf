use crate::config::{Config, DEFAULT_CONFIG_FILE, Settings};
use crate::git::HostKeyChecking;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for keygit
#[derive(Parser, Debug, Clone)]
#[command(name = "keygit")]
#[command(about = "Run Git operations authenticated with an SSH key")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Directory repositories are cloned into
    #[arg(long, value_name = "DIR", env = "KEYGIT_BASE_PATH", global = true)]
    pub base_path: Option<PathBuf>,

    /// Private key used for SSH transport
    #[arg(long, value_name = "PATH", env = "KEYGIT_SSH_KEY", global = true)]
    pub ssh_key: Option<PathBuf>,

    /// StrictHostKeyChecking policy: yes, accept-new or no
    #[arg(long, value_name = "POLICY", global = true)]
    pub host_key_checking: Option<HostKeyChecking>,

    /// Remote used by fetch and push
    #[arg(long, value_name = "NAME", global = true)]
    pub remote: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "PATH", env = "KEYGIT_CONFIG", global = true)]
    pub config: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Git operations exposed on the command line
///
/// `REPO` is a directory name under the base path.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clone a repository into the base path
    Clone {
        /// Repository URL (SSH, HTTPS or file://)
        url: String,

        /// Directory name under the base path (defaults to the repository name)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Branch to clone
        #[arg(short, long, value_name = "BRANCH")]
        branch: Option<String>,

        /// API token for HTTPS remotes
        #[arg(long, value_name = "TOKEN", env = "KEYGIT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Fetch from the remote
    Fetch {
        #[arg(value_name = "REPO")]
        repo: String,
    },

    /// Pull the latest changes
    Pull {
        #[arg(value_name = "REPO")]
        repo: String,

        /// Check out this branch before pulling
        #[arg(short, long, value_name = "BRANCH")]
        branch: Option<String>,
    },

    /// Push to the remote
    Push {
        #[arg(value_name = "REPO")]
        repo: String,

        /// Branch to push
        #[arg(short, long, value_name = "BRANCH")]
        branch: Option<String>,
    },

    /// Record a commit
    Commit {
        #[arg(value_name = "REPO")]
        repo: String,

        /// Commit message
        #[arg(short, long, value_name = "MESSAGE")]
        message: String,

        /// Stage all changes, including untracked files, first
        #[arg(short, long)]
        all: bool,
    },

    /// Show branch, upstream divergence and uncommitted changes
    Status {
        #[arg(value_name = "REPO")]
        repo: String,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the current branch
    Branch {
        #[arg(value_name = "REPO")]
        repo: String,
    },

    /// Change the remote URL
    SetRemote {
        #[arg(value_name = "REPO")]
        repo: String,

        /// New remote URL
        url: String,

        /// API token for HTTPS remotes
        #[arg(long, value_name = "TOKEN", env = "KEYGIT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

impl Args {
    /// Configuration file to read, and whether it was asked for explicitly
    #[must_use]
    pub fn config_path(&self) -> (String, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (DEFAULT_CONFIG_FILE.to_owned(), false),
        }
    }

    /// Apply command-line overrides on top of file configuration
    #[must_use]
    pub fn merge_into(&self, config: Config) -> Settings {
        let mut settings = config.into_settings();
        if let Some(base_path) = &self.base_path {
            settings.base_path.clone_from(base_path);
        }
        if let Some(key) = &self.ssh_key {
            settings.ssh_key_path = Some(key.clone());
        }
        if let Some(policy) = self.host_key_checking {
            settings.host_key_checking = policy;
        }
        if let Some(remote) = &self.remote {
            settings.remote.clone_from(remote);
        }
        settings
    }
}
