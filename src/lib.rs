//! `keygit` - Git operations authenticated with an SSH key
//!
//! This library provides a small facade, [`operations::GitOperations`], that
//! clones repositories into a base directory and runs fetch, pull, push,
//! commit and status against them. Network operations go through the system
//! `git` binary with `GIT_SSH_COMMAND` pointing at the configured key;
//! read-only queries use `git2`.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod operations;
pub mod system;
pub mod utils;

use anyhow::Result;
use cli::Args;
use config::Config;
use error::GitOpsError;
use git::check_git_availability;
use operations::GitOperations;
use system::System;
use tracing::debug;

/// Main entry point for the keygit binary
pub fn run(args: &Args, system: &dyn System) -> Result<()> {
    let config = load_config(args, system)?;
    let settings = args.merge_into(config);

    check_git_availability()?;

    let ops = GitOperations::new(system, &settings)?;
    cli::execute(&ops, &args.command)
}

/// Read the configuration file, if any
///
/// An explicitly requested file must exist; the default one is optional.
fn load_config(args: &Args, system: &dyn System) -> Result<Config> {
    let (path, explicit) = args.config_path();

    if !explicit && !system.exists(std::path::Path::new(&path)) {
        debug!("No {path} found, using defaults");
        return Ok(Config::default());
    }

    Config::load_from_file(system, &path).map_err(|e| {
        if e.downcast_ref::<GitOpsError>().is_some() {
            e
        } else {
            GitOpsError::configuration(format!("{e:#}")).into()
        }
    })
}
