//! Console rendering of test trees and run summaries
//!
//! [`ConsoleRunner`] renders live notifications as an indented tree.
//! [`ResultFormatter`] renders the final [`RunSummary`].

use std::cell::RefCell;
use std::io::{self, Write};

use super::TestRunner;
use crate::executor::RunSummary;
use crate::models::{TestOutcome, TestStatus};

const INDENT: &str = "  ";

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Tree,
    Summary,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tree" | "table" => Some(OutputFormat::Tree),
            "summary" => Some(OutputFormat::Summary),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    /// Whether the tree is rendered live while it runs
    pub fn streams(&self) -> bool {
        matches!(self, OutputFormat::Tree)
    }
}

/// Test runner writing an indented tree to any writer
pub struct ConsoleRunner<W: Write> {
    out: RefCell<W>,
    colorize: bool,
}

impl ConsoleRunner<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl ConsoleRunner<Vec<u8>> {
    pub fn buffered() -> Self {
        Self::new(Vec::new()).no_color()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out.borrow()).into_owned()
    }
}

impl<W: Write> ConsoleRunner<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn with_color(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    fn line(&self, level: usize, text: &str) {
        let mut out = self.out.borrow_mut();
        // A closed pipe must not abort the run.
        let _ = writeln!(out, "{}{}", INDENT.repeat(level), text);
    }

    fn paint(&self, text: &str, status: TestStatus) -> String {
        if !self.colorize {
            return text.to_string();
        }
        let code = match status {
            TestStatus::Pass => "32",
            TestStatus::Fail => "31",
            TestStatus::Skip => "33",
        };
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn results_line(&self, npass: usize, nfail: usize, nskip: usize) -> String {
        let total = npass + nfail + nskip;
        let passed = format!("{npass} / {total}");
        let passed = if nfail > 0 {
            self.paint(&passed, TestStatus::Fail)
        } else {
            self.paint(&passed, TestStatus::Pass)
        };
        let mut line = format!("Results: {passed} tests passed");
        if nskip > 0 {
            line.push_str(&format!(", {nskip} skipped"));
        }
        line
    }
}

impl<W: Write> TestRunner for ConsoleRunner<W> {
    fn report_suite_start(&self, name: &str, ntestcases: usize, ntests: usize, level: usize) {
        self.line(
            level,
            &format!("\"{name}\" test suite starting ({ntestcases} test suites/cases, {ntests} tests)"),
        );
    }

    fn report_suite_result(&self, npass: usize, nfail: usize, nskip: usize, level: usize) {
        self.line(level, &self.results_line(npass, nfail, nskip));
    }

    fn report_test_case_start(&self, name: &str, ntests: usize, level: usize) {
        self.line(level, &format!("\"{name}\" test case starting ({ntests} tests)"));
    }

    fn report_test_result(&self, name: &str, outcome: &TestOutcome, level: usize) {
        let status = outcome.status();
        let label = match outcome {
            TestOutcome::Pass => "passed".to_string(),
            TestOutcome::Fail(msg) => format!("failed \"{msg}\""),
            TestOutcome::Skip(msg) => format!("skipped \"{msg}\""),
        };
        let symbol = self.paint(status.symbol(), status);
        self.line(level, &format!("{symbol} {name}: {label}"));
    }

    fn report_test_case_result(&self, npass: usize, nfail: usize, nskip: usize, level: usize) {
        self.line(level, &self.results_line(npass, nfail, nskip));
    }
}

/// Summary formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format the summary of a finished run
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Tree => self.format_summary_footer(summary),
            OutputFormat::Summary => self.format_summary_brief(summary),
            OutputFormat::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
        }
    }

    fn format_summary_footer(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " {} ({} test suites/cases, {} tests)\n",
            summary.name, summary.ntestcases, summary.ntests
        ));
        output.push_str("══════════════════════════════════════════════════════════════\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.npass)
        } else {
            summary.npass.to_string()
        };
        let fail_str = if self.colorize && summary.nfail > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.nfail)
        } else {
            summary.nfail.to_string()
        };

        output.push_str(&format!(
            " Pass: {} | Fail: {} | Skip: {} | Pass Rate: {:.1}%\n",
            pass_str,
            fail_str,
            summary.nskip,
            summary.pass_rate()
        ));

        if !summary.construction_errors.is_empty() {
            output.push_str("\n Not constructed:\n");
            for error in &summary.construction_errors {
                output.push_str(&format!("   - {error}\n"));
            }
        }

        output
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}: {}/{} passed, {} failed, {} skipped ({:.1}%)",
            summary.name,
            summary.npass,
            summary.ntests,
            summary.nfail,
            summary.nskip,
            summary.pass_rate()
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Tree)
    }
}
