//! Configuration module
//!
//! Handles loading and managing configuration. Sources are layered:
//! defaults, then the config file, then `UNIT_SUITE_*` variables, then
//! command-line flags.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::ConfigFile;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::suite::DiscoveryConventions;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory discovered when none is given on the command line
    pub home: Option<PathBuf>,

    /// Output format (tree, summary, json)
    pub format: String,

    /// Defer reporting and show only failing branches
    pub failures_only: bool,

    /// Colorize console output
    pub color: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// File-naming conventions for discovery
    pub conventions: DiscoveryConventions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home: None,
            format: "tree".to_string(),
            failures_only: false,
            color: true,
            log_level: "warn".to_string(),
            conventions: DiscoveryConventions::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if file::is_yaml_file(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if file::is_yaml_file(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Overlay values set in the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(home) = &env.home {
            self.home = Some(PathBuf::from(home));
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(failures_only) = env.failures_only {
            self.failures_only = failures_only;
        }
        if let Some(no_color) = env.no_color {
            self.color = !no_color;
        }
        if let Some(log_level) = &env.log_level {
            self.log_level = log_level.clone();
        }
    }

    /// Check the effective settings, whatever layer they came from
    pub fn validate(&self) -> Result<()> {
        file::validate_format(&self.format)?;
        file::validate_conventions(&self.conventions)
    }

    /// Discovery root, falling back to the current directory
    pub fn home_or_current(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
