//! Shared fixtures for unit tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::{NodeContext, TestOutcome};
use crate::output::TestRunner;
use crate::registry::TestRegistry;

/// One notification received by [`RecordingRunner`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SuiteStart {
        name: String,
        ntestcases: usize,
        ntests: usize,
        level: usize,
    },
    SuiteResult {
        npass: usize,
        nfail: usize,
        nskip: usize,
        level: usize,
    },
    CaseStart {
        name: String,
        ntests: usize,
        level: usize,
    },
    Test {
        name: String,
        outcome: TestOutcome,
        level: usize,
    },
    CaseResult {
        npass: usize,
        nfail: usize,
        nskip: usize,
        level: usize,
    },
}

/// Runner keeping every notification in order
#[derive(Default)]
pub struct RecordingRunner {
    events: RefCell<Vec<Event>>,
}

impl RecordingRunner {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl TestRunner for RecordingRunner {
    fn report_suite_start(&self, name: &str, ntestcases: usize, ntests: usize, level: usize) {
        self.push(Event::SuiteStart {
            name: name.to_string(),
            ntestcases,
            ntests,
            level,
        });
    }

    fn report_suite_result(&self, npass: usize, nfail: usize, nskip: usize, level: usize) {
        self.push(Event::SuiteResult {
            npass,
            nfail,
            nskip,
            level,
        });
    }

    fn report_test_case_start(&self, name: &str, ntests: usize, level: usize) {
        self.push(Event::CaseStart {
            name: name.to_string(),
            ntests,
            level,
        });
    }

    fn report_test_result(&self, name: &str, outcome: &TestOutcome, level: usize) {
        self.push(Event::Test {
            name: name.to_string(),
            outcome: outcome.clone(),
            level,
        });
    }

    fn report_test_case_result(&self, npass: usize, nfail: usize, nskip: usize, level: usize) {
        self.push(Event::CaseResult {
            npass,
            nfail,
            nskip,
            level,
        });
    }
}

/// Context over `registry` with a recording runner, rooted at `.`
pub fn context_with(registry: TestRegistry) -> (NodeContext, Rc<RecordingRunner>) {
    let runner = Rc::new(RecordingRunner::default());
    let reporter: Rc<dyn TestRunner> = runner.clone();
    let ctx = NodeContext::new(reporter, Rc::new(registry), ".");
    (ctx, runner)
}

pub fn context() -> (NodeContext, Rc<RecordingRunner>) {
    context_with(TestRegistry::new())
}
