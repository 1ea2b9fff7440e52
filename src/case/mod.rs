//! Leaf test cases
//!
//! [`TestCase`] runs named test functions written in Rust. [`ScriptLoader`]
//! builds cases and suites from definition files on disk.

mod script;
mod test_case;

pub use script::{CaseDefinition, Definition, ScriptLoader, ScriptTest, SuiteDefinition};
pub use test_case::{TestCase, TestFailure, TestFn, TestResult};
