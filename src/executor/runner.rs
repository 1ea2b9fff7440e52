//! Test session
//!
//! Builds a root suite from a [`RunConfig`], runs it and summarizes the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

use crate::error::SuiteError;
use crate::models::{NodeContext, NodeProperty, TestNode};
use crate::output::TestRunner;
use crate::registry::TestRegistry;
use crate::suite::{DiscoveryConventions, Suite};

/// What to run and how
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Root suite name; defaults to the base name of `home`
    pub name: Option<String>,

    pub home: PathBuf,

    /// Explicit identifiers; empty means discover everything under `home`
    pub tests: Vec<String>,

    pub failures_only: bool,

    pub conventions: DiscoveryConventions,
}

impl RunConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            home: home.into(),
            tests: Vec::new(),
            failures_only: false,
            conventions: DiscoveryConventions::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tests(mut self, tests: Vec<String>) -> Self {
        self.tests = tests;
        self
    }

    pub fn with_failures_only(mut self, failures_only: bool) -> Self {
        self.failures_only = failures_only;
        self
    }

    pub fn with_conventions(mut self, conventions: DiscoveryConventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Name of the root suite
    pub fn root_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| base_name(&self.home))
    }
}

fn base_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| path.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}

/// Outcome of a whole session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    pub npass: usize,
    pub nfail: usize,
    pub nskip: usize,
    pub ntests: usize,
    pub ntestcases: usize,
    pub failures_only: bool,
    pub construction_errors: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(property: NodeProperty, failures_only: bool, errors: &[SuiteError]) -> Self {
        Self {
            name: property.name,
            npass: property.npass,
            nfail: property.nfail,
            nskip: property.nskip,
            ntests: property.ntests,
            ntestcases: property.ntestcases,
            failures_only,
            construction_errors: errors.iter().map(ToString::to_string).collect(),
            finished_at: Utc::now(),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.ntests == 0 {
            0.0
        } else {
            (self.npass as f64 / self.ntests as f64) * 100.0
        }
    }

    /// No failures and nothing left out of the tree
    pub fn is_all_passed(&self) -> bool {
        self.nfail == 0 && self.construction_errors.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} tests)", self.name, self.ntests)?;
        writeln!(
            f,
            "Pass: {} | Fail: {} | Skip: {} | Not constructed: {}",
            self.npass,
            self.nfail,
            self.nskip,
            self.construction_errors.len()
        )?;
        write!(f, "Pass Rate: {:.1}%", self.pass_rate())
    }
}

/// Kind of a node in a listed tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Suite,
    Case,
}

/// One line of a listed tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub name: String,
    pub level: usize,
    pub ntests: usize,
    pub kind: NodeKind,
}

/// Depth-first listing of a built tree
pub fn tree(root: &dyn TestNode) -> Vec<TreeEntry> {
    let mut entries = Vec::new();
    collect(root, &mut entries);
    entries
}

fn collect(node: &dyn TestNode, entries: &mut Vec<TreeEntry>) {
    let kind = if node.is_leaf() {
        NodeKind::Case
    } else {
        NodeKind::Suite
    };
    entries.push(TreeEntry {
        name: node.name().to_string(),
        level: node.level(),
        ntests: node.property().ntests,
        kind,
    });
    for child in node.children() {
        collect(child.as_ref(), entries);
    }
}

/// Session running one tree against a shared registry and reporter
pub struct SuiteSession {
    config: RunConfig,
    registry: Rc<TestRegistry>,
    reporter: Rc<dyn TestRunner>,
}

impl SuiteSession {
    pub fn new(config: RunConfig, registry: Rc<TestRegistry>, reporter: Rc<dyn TestRunner>) -> Self {
        Self {
            config,
            registry,
            reporter,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Build the root suite and report anything that could not be constructed
    pub fn build(&self) -> (Suite, Vec<SuiteError>) {
        let ctx = NodeContext::new(
            Rc::clone(&self.reporter),
            Rc::clone(&self.registry),
            &self.config.home,
        )
        .with_conventions(self.config.conventions.clone())
        .with_failures_only(self.config.failures_only);

        let mut root = Suite::new(self.config.root_name(), ctx);
        let failures = if self.config.tests.is_empty() {
            root.add_all()
        } else {
            root.add(&self.config.tests)
        };
        root.set_level(0);

        info!(
            "Built {} with {} children and {} tests",
            root.name(),
            root.ntestcases(),
            root.ntests()
        );
        (root, failures)
    }

    /// Build, run and summarize the tree
    ///
    /// In failures-only mode the failing branches are displayed after the run.
    pub fn run(&self) -> RunSummary {
        let (mut root, failures) = self.build();
        root.run();
        if self.config.failures_only {
            root.display();
        }
        RunSummary::new(root.property(), self.config.failures_only, &failures)
    }
}
