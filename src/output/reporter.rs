//! Reporting protocol
//!
//! A [`TestRunner`] is a pure sink: suites and cases push start/result
//! notifications in depth-first order and the runner renders them.

use crate::models::TestOutcome;

/// Sink for structured test notifications
///
/// Calls arrive from arbitrary recursion depth; `level` is the depth of the
/// node that emits them. Methods take `&self`, implementations that write
/// keep their state behind interior mutability.
pub trait TestRunner {
    fn report_suite_start(&self, name: &str, ntestcases: usize, ntests: usize, level: usize);

    fn report_suite_result(&self, npass: usize, nfail: usize, nskip: usize, level: usize);

    fn report_test_case_start(&self, _name: &str, _ntests: usize, _level: usize) {}

    fn report_test_result(&self, _name: &str, _outcome: &TestOutcome, _level: usize) {}

    fn report_test_case_result(&self, _npass: usize, _nfail: usize, _nskip: usize, _level: usize) {}
}

/// Runner that discards every notification
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRunner;

impl TestRunner for NullRunner {
    fn report_suite_start(&self, _name: &str, _ntestcases: usize, _ntests: usize, _level: usize) {}

    fn report_suite_result(&self, _npass: usize, _nfail: usize, _nskip: usize, _level: usize) {}
}
