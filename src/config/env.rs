//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "UNIT_SUITE";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Discovery root from UNIT_SUITE_HOME
    pub home: Option<String>,
    /// Output format from UNIT_SUITE_FORMAT
    pub format: Option<String>,
    /// Failures-only mode from UNIT_SUITE_FAILURES_ONLY
    pub failures_only: Option<bool>,
    /// Config file from UNIT_SUITE_CONFIG
    pub config_file: Option<String>,
    /// Log level from UNIT_SUITE_LOG
    pub log_level: Option<String>,
    /// Disable color from UNIT_SUITE_NO_COLOR
    pub no_color: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            home: get_env("HOME"),
            format: get_env("FORMAT"),
            failures_only: get_env_bool("FAILURES_ONLY"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
            no_color: get_env_bool("NO_COLOR"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.home.is_some()
            || self.format.is_some()
            || self.failures_only.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
            || self.no_color.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_HOME:          {:?}", ENV_PREFIX, self.home);
        println!("  {}_FORMAT:        {:?}", ENV_PREFIX, self.format);
        println!("  {}_FAILURES_ONLY: {:?}", ENV_PREFIX, self.failures_only);
        println!("  {}_CONFIG:        {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:           {:?}", ENV_PREFIX, self.log_level);
        println!("  {}_NO_COLOR:      {:?}", ENV_PREFIX, self.no_color);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    fn var(mut self, name: &str, value: String) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value));
        self
    }

    pub fn home(self, home: impl Into<String>) -> Self {
        self.var("HOME", home.into())
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.var("FORMAT", format.into())
    }

    pub fn failures_only(self, failures_only: bool) -> Self {
        self.var("FAILURES_ONLY", failures_only.to_string())
    }

    pub fn config_file(self, path: impl Into<String>) -> Self {
        self.var("CONFIG", path.into())
    }

    pub fn log_level(self, level: impl Into<String>) -> Self {
        self.var("LOG", level.into())
    }

    pub fn no_color(self, no_color: bool) -> Self {
        self.var("NO_COLOR", no_color.to_string())
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all UNIT_SUITE environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_HOME           Directory discovered when none is given");
    println!("  {ENV_PREFIX}_FORMAT         Output format (tree, summary, json)");
    println!("  {ENV_PREFIX}_FAILURES_ONLY  Show only failing branches (true/false)");
    println!("  {ENV_PREFIX}_CONFIG         Path to configuration file");
    println!("  {ENV_PREFIX}_LOG            Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_NO_COLOR       Disable colored output (true/false)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_HOME=tests/unit");
    println!("  export {ENV_PREFIX}_FAILURES_ONLY=true");
    println!("  unit-suite run");
}
