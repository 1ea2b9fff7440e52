//! Test result models
//!
//! Defines per-test outcomes, statuses and the node property projection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Fail => "✗",
            TestStatus::Skip => "○",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
        }
    }
}

/// Outcome of a single test method
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum TestOutcome {
    Pass,
    Fail(String),
    Skip(String),
}

impl TestOutcome {
    pub fn status(&self) -> TestStatus {
        match self {
            TestOutcome::Pass => TestStatus::Pass,
            TestOutcome::Fail(_) => TestStatus::Fail,
            TestOutcome::Skip(_) => TestStatus::Skip,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            TestOutcome::Pass => None,
            TestOutcome::Fail(msg) | TestOutcome::Skip(msg) => Some(msg),
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status().symbol(), self.status())?;
        if let Some(msg) = self.message() {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Recorded outcome of one named test from the last run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    pub outcome: TestOutcome,
}

impl TestRecord {
    pub fn new(name: impl Into<String>, outcome: TestOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

/// Read-only projection of a test node's counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperty {
    pub name: String,
    pub npass: usize,
    pub nfail: usize,
    pub nskip: usize,
    pub ntests: usize,
    pub ntestcases: usize,
}

impl NodeProperty {
    /// Number of tests that produced an outcome in the last run
    pub fn nrun(&self) -> usize {
        self.npass + self.nfail + self.nskip
    }

    pub fn pass_rate(&self) -> f64 {
        if self.ntests == 0 {
            0.0
        } else {
            (self.npass as f64 / self.ntests as f64) * 100.0
        }
    }
}

impl fmt::Display for NodeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} / {} passed, {} failed, {} skipped",
            self.name, self.npass, self.ntests, self.nfail, self.nskip
        )
    }
}
