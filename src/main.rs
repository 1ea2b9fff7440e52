//! Unit Suite - hierarchical unit test organizer
//!
//! Discovers test cases and suites from a directory tree by file-name
//! convention, runs them and reports aggregated results.
//!
//! ## Usage
//!
//! ```bash
//! # Run everything under a directory
//! unit-suite run tests/unit
//!
//! # Run one case and a single test of another
//! unit-suite run tests/unit -t math_ut -t io_ut.reads
//!
//! # Only show what failed
//! unit-suite run tests/unit --failures-only
//!
//! # Show the discovered tree
//! unit-suite list tests/unit
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

use unit_suite::config::{AppConfig, ConfigFile, EnvConfig};
use unit_suite::executor::{tree, NodeKind, RunConfig, SuiteSession};
use unit_suite::output::{ConsoleRunner, NullRunner, OutputFormat, ResultFormatter, TestRunner};
use unit_suite::registry::TestRegistry;
use unit_suite::utils::{init_logger, LogLevel};
use unit_suite::ScriptLoader;

mod cli;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config = load_config(args.config.clone(), &env)?;

    init_logger(LogLevel::resolve(args.verbose, &config.log_level));

    match args.command {
        cli::Command::Run(run_args) => {
            if !run_tests(run_args, config)? {
                std::process::exit(1);
            }
        }
        cli::Command::List(list_args) => {
            list_tests(list_args, config);
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, config, &env)?;
        }
    }

    Ok(())
}

/// Defaults, then the config file, then the environment
fn load_config(explicit: Option<PathBuf>, env: &EnvConfig) -> Result<AppConfig> {
    let file = match explicit.or_else(|| env.config_file.as_ref().map(PathBuf::from)) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut config = file.app;
    config.apply_env(env);
    config.validate()?;
    Ok(config)
}

fn registry() -> Rc<TestRegistry> {
    Rc::new(TestRegistry::new().with_fallback(ScriptLoader::new()))
}

fn run_config(home: Option<PathBuf>, tests: Vec<String>, config: &AppConfig) -> RunConfig {
    let home = home.unwrap_or_else(|| config.home_or_current());
    RunConfig::new(home)
        .with_tests(tests)
        .with_conventions(config.conventions.clone())
}

/// Run a tree; returns whether everything passed
fn run_tests(args: cli::RunArgs, mut config: AppConfig) -> Result<bool> {
    if let Some(format) = args.format {
        config.format = format;
    }
    config.failures_only |= args.failures_only;
    config.color &= !args.no_color;

    let format = OutputFormat::from_str(&config.format).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown output format: {} (expected tree, summary or json)",
            config.format
        )
    })?;

    let mut run = run_config(args.home, args.tests, &config).with_failures_only(config.failures_only);
    if let Some(name) = args.name {
        run = run.with_name(name);
    }

    info!(
        "Running tests in {} ({} format{})",
        run.home.display(),
        config.format,
        if run.failures_only { ", failures only" } else { "" }
    );

    let reporter: Rc<dyn TestRunner> = if format.streams() {
        Rc::new(ConsoleRunner::stdout().with_color(config.color))
    } else {
        Rc::new(NullRunner)
    };

    let summary = SuiteSession::new(run, registry(), reporter).run();

    let mut formatter = ResultFormatter::new(format);
    if !config.color {
        formatter = formatter.no_color();
    }
    println!("{}", formatter.format_summary(&summary));

    debug!("Run finished at {}", summary.finished_at);
    Ok(summary.is_all_passed())
}

fn list_tests(args: cli::ListArgs, config: AppConfig) {
    let run = run_config(args.home, args.tests, &config);
    let home = run.home.clone();
    let session = SuiteSession::new(run, registry(), Rc::new(NullRunner));
    let (root, failures) = session.build();

    println!("\nTest tree in {}\n", home.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for entry in tree(&root) {
        let indent = "  ".repeat(entry.level);
        match entry.kind {
            NodeKind::Suite => println!("{indent}{}/ ({} tests)", entry.name, entry.ntests),
            NodeKind::Case => println!("{indent}{} ({} tests)", entry.name, entry.ntests),
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if !failures.is_empty() {
        println!("Not constructed:");
        for failure in &failures {
            println!("  - {failure}");
        }
        println!();
    }
}

fn manage_config(args: cli::ConfigArgs, config: AppConfig, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            ConfigFile::example().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env: show_env, format } => {
            if show_env {
                env.print_summary();
                println!();
                unit_suite::config::print_env_help();
            } else {
                let effective = ConfigFile {
                    app: config,
                    ..ConfigFile::default()
                };
                let output = if format == "json" {
                    serde_json::to_string_pretty(&effective)?
                } else {
                    serde_yaml::to_string(&effective)?
                };
                println!("{output}");
            }
        }
    }

    Ok(())
}
