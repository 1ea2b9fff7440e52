//! Leaf test case
//!
//! A [`TestCase`] owns an ordered list of named test functions with optional
//! setup/teardown hooks. A panicking test counts as a failure; nothing
//! escapes `run()`.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    canonical_name, NodeContext, NodeProperty, TestNode, TestOutcome, TestRecord, TestStatus,
};
use crate::output::TestRunner;

/// Why a test did not pass
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TestFailure {
    #[error("{0}")]
    Fail(String),

    #[error("skipped: {0}")]
    Skip(String),
}

impl TestFailure {
    pub fn fail(message: impl Into<String>) -> Self {
        TestFailure::Fail(message.into())
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        TestFailure::Skip(reason.into())
    }
}

impl From<String> for TestFailure {
    fn from(message: String) -> Self {
        TestFailure::Fail(message)
    }
}

impl From<&str> for TestFailure {
    fn from(message: &str) -> Self {
        TestFailure::Fail(message.to_string())
    }
}

/// Result of one test function
pub type TestResult = Result<(), TestFailure>;

/// A test function or hook
pub type TestFn = Box<dyn Fn() -> TestResult>;

/// Leaf node running named test functions
pub struct TestCase {
    name: String,
    level: usize,
    reporter: Rc<dyn TestRunner>,
    failures_only: bool,
    tests: Vec<(String, TestFn)>,
    setup: Option<TestFn>,
    teardown: Option<TestFn>,
    only: Option<String>,
    records: Vec<TestRecord>,
    npass: usize,
    nfail: usize,
    nskip: usize,
}

impl TestCase {
    pub fn new(name: impl AsRef<str>, ctx: &NodeContext) -> Self {
        Self {
            name: canonical_name(name.as_ref()),
            level: 0,
            reporter: Rc::clone(&ctx.reporter),
            failures_only: ctx.failures_only,
            tests: Vec::new(),
            setup: None,
            teardown: None,
            only: None,
            records: Vec::new(),
            npass: 0,
            nfail: 0,
            nskip: 0,
        }
    }

    /// Append a named test
    pub fn test<F>(mut self, name: impl Into<String>, test: F) -> Self
    where
        F: Fn() -> TestResult + 'static,
    {
        self.add_test(name, test);
        self
    }

    pub fn add_test<F>(&mut self, name: impl Into<String>, test: F)
    where
        F: Fn() -> TestResult + 'static,
    {
        self.tests.push((name.into(), Box::new(test)));
    }

    /// Hook run before every test
    pub fn setup<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> TestResult + 'static,
    {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Hook run after every test whose setup succeeded
    pub fn teardown<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> TestResult + 'static,
    {
        self.teardown = Some(Box::new(hook));
        self
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Outcomes of the last run, in execution order
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    fn is_selected(&self, test_name: &str) -> bool {
        match &self.only {
            Some(only) => only.eq_ignore_ascii_case(test_name),
            None => true,
        }
    }

    fn ntests(&self) -> usize {
        self.tests
            .iter()
            .filter(|(name, _)| self.is_selected(name))
            .count()
    }

    fn run_one(&self, test: &TestFn) -> TestOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| -> TestResult {
            if let Some(setup) = &self.setup {
                match setup() {
                    Ok(()) => {}
                    Err(TestFailure::Fail(msg)) => {
                        return Err(TestFailure::Fail(format!("setup failed: {msg}")))
                    }
                    Err(skip) => return Err(skip),
                }
            }

            let result = test();

            if let Some(teardown) = &self.teardown {
                if let Err(e) = teardown() {
                    if result.is_ok() {
                        return Err(TestFailure::Fail(format!("teardown failed: {e}")));
                    }
                    debug!("teardown failed after failing test: {}", e);
                }
            }
            result
        }));

        match result {
            Ok(Ok(())) => TestOutcome::Pass,
            Ok(Err(TestFailure::Fail(msg))) => TestOutcome::Fail(msg),
            Ok(Err(TestFailure::Skip(reason))) => TestOutcome::Skip(reason),
            Err(payload) => TestOutcome::Fail(panic_message(payload.as_ref())),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

impl TestNode for TestCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) {
        let ntests = self.ntests();
        if !self.failures_only {
            self.reporter
                .report_test_case_start(&self.name, ntests, self.level);
        }

        let records: Vec<TestRecord> = self
            .tests
            .iter()
            .filter(|(name, _)| self.is_selected(name))
            .map(|(name, test)| {
                let outcome = self.run_one(test);
                if !self.failures_only {
                    self.reporter
                        .report_test_result(name, &outcome, self.level + 1);
                }
                TestRecord::new(name.clone(), outcome)
            })
            .collect();

        self.npass = 0;
        self.nfail = 0;
        self.nskip = 0;
        for record in &records {
            match record.outcome.status() {
                TestStatus::Pass => self.npass += 1,
                TestStatus::Fail => self.nfail += 1,
                TestStatus::Skip => self.nskip += 1,
            }
        }
        self.records = records;

        if !self.failures_only {
            self.reporter
                .report_test_case_result(self.npass, self.nfail, self.nskip, self.level);
        }
    }

    fn display(&self) {
        if self.nfail == 0 {
            return;
        }
        self.reporter
            .report_test_case_start(&self.name, self.ntests(), self.level);
        for record in &self.records {
            if record.outcome.status() == TestStatus::Fail {
                self.reporter
                    .report_test_result(&record.name, &record.outcome, self.level + 1);
            }
        }
        self.reporter
            .report_test_case_result(self.npass, self.nfail, self.nskip, self.level);
    }

    fn set_level(&mut self, level: usize) {
        self.level = level;
    }

    fn level(&self) -> usize {
        self.level
    }

    fn property(&self) -> NodeProperty {
        NodeProperty {
            name: self.name.clone(),
            npass: self.npass,
            nfail: self.nfail,
            nskip: self.nskip,
            ntests: self.ntests(),
            ntestcases: 0,
        }
    }

    fn restrict_to(&mut self, method: &str) {
        if !self.tests.iter().any(|(name, _)| name.eq_ignore_ascii_case(method)) {
            warn!("{} has no test named {}", self.name, method);
        }
        self.only = Some(method.to_string());
    }
}
