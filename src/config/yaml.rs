//! YAML configuration loading and parsing

use crate::config::Config;
use crate::error::GitOpsError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::Path;

/// Load and parse YAML configuration from file
pub fn load_config(system: &dyn System, path: &str) -> Result<Config> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(GitOpsError::configuration(format!(
            "Configuration file not found: {path}"
        ))
        .into());
    }

    let content = system.read_to_string(path_obj).map_err(|e| {
        return GitOpsError::configuration(format!(
            "Failed to read configuration file: {path}: {e}"
        ));
    })?;

    parse_config(&content).with_context(|| format!("Invalid configuration file: {path}"))
}

/// Parse and validate YAML configuration text
///
/// The raw document is checked against the schema before deserializing so
/// that misspelled keys are reported instead of silently ignored.
pub fn parse_config(content: &str) -> Result<Config> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
        if let Some(location) = e.location() {
            GitOpsError::configuration(format!(
                "Failed to parse YAML at line {}, column {}: {e}",
                location.line(),
                location.column()
            ))
        } else {
            GitOpsError::configuration(format!("Failed to parse YAML: {e}"))
        }
    })?;

    let mut value = serde_json::to_value(&document)
        .context("Failed to convert configuration to JSON for validation")?;
    if value.is_null() {
        value = Value::Object(serde_json::Map::new());
    }

    crate::config::schema::validate_against_schema(&value)
        .map_err(|e| GitOpsError::configuration(e.to_string()))?;

    let config: Config = serde_json::from_value(value)
        .map_err(|e| GitOpsError::configuration(format!("Invalid configuration: {e}")))?;

    Ok(config)
}
