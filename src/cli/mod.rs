//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hierarchical unit test organizer
#[derive(Parser, Debug)]
#[command(name = "unit-suite")]
#[command(author = "hephaex@gmail.com")]
#[command(version = "0.1.0")]
#[command(about = "Discover, run and report trees of unit test suites")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a test tree
    Run(RunArgs),

    /// List the discovered test tree without running it
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory to discover tests in
    pub home: Option<PathBuf>,

    /// Run only these test types (`type` or `type.test`); repeatable
    #[arg(short, long = "test")]
    pub tests: Vec<String>,

    /// Show only failing branches, after the run
    #[arg(short, long)]
    pub failures_only: bool,

    /// Output format (tree, summary, json)
    #[arg(long)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Name of the root suite
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory to discover tests in
    pub home: Option<PathBuf>,

    /// List only these test types; repeatable
    #[arg(short, long = "test")]
    pub tests: Vec<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Show environment variables instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write an example configuration file
    Init {
        /// Destination path
        #[arg(default_value = "./unit-suite.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
