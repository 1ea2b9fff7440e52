//! Unit Suite - hierarchical unit test organizer
//!
//! Test types are arranged in a tree: suites hold test cases and nested
//! suites, test cases hold named tests. A suite discovers its members from
//! the directory it lives in by file-name convention, constructs them by
//! identifier through a [`TestRegistry`], runs them in order and aggregates
//! pass/fail/skip counts upward.
//!
//! ## Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use unit_suite::{ConsoleRunner, RunConfig, ScriptLoader, SuiteSession, TestRegistry};
//!
//! let registry = TestRegistry::new().with_fallback(ScriptLoader::new());
//! let session = SuiteSession::new(
//!     RunConfig::new("tests/unit"),
//!     Rc::new(registry),
//!     Rc::new(ConsoleRunner::stdout()),
//! );
//! let summary = session.run();
//! println!("{summary}");
//! ```

pub mod case;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod registry;
pub mod suite;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use case::{ScriptLoader, TestCase, TestFailure, TestResult};
pub use error::SuiteError;
pub use executor::{RunConfig, RunSummary, SuiteSession};
pub use models::{NodeContext, NodeProperty, TestNode, TestOutcome};
pub use output::{ConsoleRunner, NullRunner, OutputFormat, ResultFormatter, TestRunner};
pub use registry::{NodeLoader, TestRegistry};
pub use suite::{DiscoveryConventions, Suite};
