//! The test node capability shared by suites and cases
//!
//! Suites are internal nodes, cases are leaves. Both are driven through
//! [`TestNode`] so a suite can hold either kind in one ordered list.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::NodeProperty;
use crate::output::TestRunner;
use crate::registry::TestRegistry;
use crate::suite::{normalize_home, DiscoveryConventions};

/// Polymorphic capability of every node in a test tree
pub trait TestNode {
    /// Canonical name of the node
    fn name(&self) -> &str;

    /// Run the node, resetting and recomputing its counters
    fn run(&mut self);

    /// Report the failing part of the node after a failures-only run
    fn display(&self);

    /// Assign the depth of this node; children receive `level + 1`
    fn set_level(&mut self, level: usize);

    fn level(&self) -> usize;

    /// Snapshot of name and counters
    fn property(&self) -> NodeProperty;

    /// Narrow execution to a single named test. Nodes without named tests ignore it.
    fn restrict_to(&mut self, _method: &str) {}

    /// Child nodes, empty for leaves
    fn children(&self) -> &[Box<dyn TestNode>] {
        &[]
    }

    /// Whether the node holds tests itself rather than child nodes
    fn is_leaf(&self) -> bool {
        true
    }
}

/// Everything a factory needs to build a node
///
/// The reporter and registry are shared by the whole tree. `home` is the
/// directory the node's definition lives in. `lineage` holds the definitions
/// whose construction is still in progress above this node.
#[derive(Clone)]
pub struct NodeContext {
    pub reporter: Rc<dyn TestRunner>,
    pub registry: Rc<TestRegistry>,
    pub conventions: DiscoveryConventions,
    pub home: PathBuf,
    pub failures_only: bool,
    pub lineage: Vec<(PathBuf, String)>,
}

impl NodeContext {
    pub fn new(
        reporter: Rc<dyn TestRunner>,
        registry: Rc<TestRegistry>,
        home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reporter,
            registry,
            conventions: DiscoveryConventions::default(),
            home: home.into(),
            failures_only: false,
            lineage: Vec::new(),
        }
    }

    pub fn with_failures_only(mut self, failures_only: bool) -> Self {
        self.failures_only = failures_only;
        self
    }

    pub fn with_conventions(mut self, conventions: DiscoveryConventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Same settings, rooted at another directory
    pub fn at_home(&self, home: impl AsRef<Path>) -> Self {
        Self {
            home: home.as_ref().to_path_buf(),
            ..self.clone()
        }
    }

    fn lineage_key(&self, identifier: &str) -> (PathBuf, String) {
        (normalize_home(&self.home), canonical_name(identifier))
    }

    /// Whether `identifier` in `home` is already being built by an ancestor
    pub fn is_building(&self, identifier: &str) -> bool {
        let key = self.lineage_key(identifier);
        self.lineage.contains(&key)
    }

    /// Context for the children of `identifier`, recording it as in progress
    pub fn building(&self, identifier: &str) -> Self {
        let mut ctx = self.clone();
        ctx.lineage.push(self.lineage_key(identifier));
        ctx
    }
}

/// Lower-cased canonical form of a type identifier
pub fn canonical_name(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Lower-cased last path segment of `T`'s type name, without generics
pub fn canonical_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let last = base.rsplit("::").next().unwrap_or(base);
    canonical_name(last)
}
