//! Test execution
//!
//! Sessions build a root suite, run it and summarize the outcome.

mod runner;

pub use runner::{tree, NodeKind, RunConfig, RunSummary, SuiteSession, TreeEntry};
