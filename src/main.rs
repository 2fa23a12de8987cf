//! # `keygit`
//!
//! Command-line front end for the `keygit` library: clone, fetch, pull, push,
//! commit and inspect repositories under a base directory, authenticating
//! with an SSH key.
//!
//! ## Usage
//!
//! ```sh
//! keygit --base-path ./repos --ssh-key ~/.ssh/id_ed25519 clone git@github.com:user/repo.git
//! keygit --base-path ./repos status repo
//! ```
//!
//! Settings can also come from `keygit.yaml` or the `KEYGIT_BASE_PATH`,
//! `KEYGIT_SSH_KEY` and `KEYGIT_TOKEN` environment variables.

use anyhow::Result;
use clap::Parser as _;
use keygit::cli::Args;
use keygit::error::{GitOpsError, classify};
use keygit::system::RealSystem;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let system = RealSystem::new();
    match keygit::run(&args, &system) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(classify(&err).map_or(1, GitOpsError::exit_code));
        }
    }
}
