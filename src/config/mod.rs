//! Configuration management module
//!
//! Handles YAML configuration parsing, JSON schema validation, and merging
//! file values with command-line overrides into [`Settings`]

pub mod schema;
pub mod yaml;

use crate::git::HostKeyChecking;
use crate::system::System;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration file looked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "keygit.yaml";

/// Remote used by fetch and push unless configured otherwise
pub const DEFAULT_REMOTE: &str = "origin";

/// Contents of a `keygit.yaml` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory repositories are cloned into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Private key used for SSH transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_key_checking: Option<HostKeyChecking>,

    /// Remote used by fetch and push
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(system: &dyn System, path: &str) -> anyhow::Result<Self> {
        yaml::load_config(system, path)
    }

    /// Resolve into settings, filling defaults for anything unset
    #[must_use]
    pub fn into_settings(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            base_path: self.base_path.map_or(defaults.base_path, PathBuf::from),
            ssh_key_path: self.ssh_key_path.map(PathBuf::from),
            host_key_checking: self
                .host_key_checking
                .unwrap_or(defaults.host_key_checking),
            remote: self.remote.unwrap_or(defaults.remote),
        }
    }
}

/// Everything `GitOperations` needs to be constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_path: PathBuf,
    pub ssh_key_path: Option<PathBuf>,
    pub host_key_checking: HostKeyChecking,
    pub remote: String,
}

impl Settings {
    /// Settings for a base path and optional key, defaults elsewhere
    #[must_use]
    pub fn new<P: Into<PathBuf>>(base_path: P, ssh_key_path: Option<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ssh_key_path,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_host_key_checking(mut self, policy: HostKeyChecking) -> Self {
        self.host_key_checking = policy;
        self
    }

    #[must_use]
    pub fn with_remote<S: Into<String>>(mut self, remote: S) -> Self {
        self.remote = remote.into();
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            ssh_key_path: None,
            host_key_checking: HostKeyChecking::default(),
            remote: DEFAULT_REMOTE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gives_defaults() {
        let settings = Config::default().into_settings();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.remote, "origin");
        assert_eq!(settings.host_key_checking, HostKeyChecking::No);
    }

    #[test]
    fn test_config_values_win_over_defaults() {
        let config = Config {
            base_path: Some("/srv/repos".to_owned()),
            ssh_key_path: Some("/keys/deploy".to_owned()),
            host_key_checking: Some(HostKeyChecking::Yes),
            remote: Some("upstream".to_owned()),
        };
        let settings = config.into_settings();
        assert_eq!(settings.base_path, PathBuf::from("/srv/repos"));
        assert_eq!(settings.ssh_key_path, Some(PathBuf::from("/keys/deploy")));
        assert_eq!(settings.host_key_checking, HostKeyChecking::Yes);
        assert_eq!(settings.remote, "upstream");
    }
}
