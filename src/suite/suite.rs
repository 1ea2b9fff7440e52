//! Composite test suite
//!
//! A [`Suite`] owns an ordered list of child nodes, populated explicitly by
//! identifier or by discovery from its home directory. Running it runs every
//! child in order and sums their counters; one child's failure never stops
//! its siblings.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::discovery::{self, normalize_home};
use crate::error::SuiteError;
use crate::models::{canonical_name, canonical_type_name, NodeContext, NodeProperty, TestNode};
use crate::registry::{NodeLoader, NodeResult};

/// Internal node of a test tree
pub struct Suite {
    name: String,
    home: PathBuf,
    ctx: NodeContext,
    children: Vec<Box<dyn TestNode>>,
    level: usize,
    npass: usize,
    nfail: usize,
    nskip: usize,
}

impl Suite {
    /// Create an empty suite rooted at `ctx.home`
    pub fn new(name: impl AsRef<str>, ctx: NodeContext) -> Self {
        let home = normalize_home(&ctx.home);
        let ctx = ctx.at_home(&home);
        Self {
            name: canonical_name(name.as_ref()),
            home,
            ctx,
            children: Vec::new(),
            level: 0,
            npass: 0,
            nfail: 0,
            nskip: 0,
        }
    }

    /// Create an empty suite named after the type `T`
    pub fn for_type<T: ?Sized>(ctx: NodeContext) -> Self {
        Self::new(canonical_type_name::<T>(), ctx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discovery root, always ending with a separator
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn failures_only(&self) -> bool {
        self.ctx.failures_only
    }

    /// Number of direct children
    pub fn ntestcases(&self) -> usize {
        self.children.len()
    }

    /// Number of tests in the whole subtree
    pub fn ntests(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.property().ntests)
            .sum()
    }

    pub fn context(&self) -> &NodeContext {
        &self.ctx
    }

    /// Append an already constructed node as the last child
    pub fn push(&mut self, mut child: Box<dyn TestNode>) {
        child.set_level(self.level + 1);
        self.children.push(child);
    }

    /// Register children by identifier, in order
    ///
    /// An identifier may name a single test as `type.method`. Identifiers
    /// equal to this suite's own name are ignored. Children that fail to
    /// construct are left out and returned; the rest are still registered.
    pub fn add<S: AsRef<str>>(&mut self, identifiers: &[S]) -> Vec<SuiteError> {
        let ctx = self.ctx.clone();
        identifiers
            .iter()
            .filter_map(|identifier| {
                let (type_name, method) = ctx.conventions.split_qualifier(identifier.as_ref());
                self.register(type_name, method, &ctx).err()
            })
            .collect()
    }

    /// Populate from the home directory
    ///
    /// Leaf definitions in `home` are registered first. Then every
    /// subdirectory either contributes the suite it declares, a synthesized
    /// suite when it holds leaf definitions, or nothing.
    pub fn add_all(&mut self) -> Vec<SuiteError> {
        let conventions = self.ctx.conventions.clone();
        let home = self.home.clone();
        let mut failures = Vec::new();

        // File-derived identifiers are taken whole; a separator in a file
        // name is not a method qualifier.
        let ctx = self.ctx.clone();
        let cases = discovery::case_identifiers(&home, &conventions);
        debug!("{}: {} cases in {}", self.name, cases.len(), home.display());
        for case in &cases {
            if let Err(e) = self.register(case, None, &ctx) {
                failures.push(e);
            }
        }

        for dir in discovery::subdirectories(&home) {
            let ctx = self.ctx.at_home(normalize_home(&dir));

            if let Some(suite_id) = discovery::suite_identifier(&dir, &conventions) {
                // A declared suite owns its subtree.
                if let Err(e) = self.register(&suite_id, None, &ctx) {
                    failures.push(e);
                }
                continue;
            }

            if discovery::case_identifiers(&dir, &conventions).is_empty() {
                debug!("{}: no tests in {}", self.name, dir.display());
                continue;
            }

            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string());
            let mut child = Suite::new(name, ctx);
            failures.extend(child.add_all());
            self.push(Box::new(child));
        }

        failures
    }

    /// Construct and append one child; `Ok` also covers the self-reference skip
    fn register(
        &mut self,
        type_name: &str,
        method: Option<&str>,
        ctx: &NodeContext,
    ) -> Result<(), SuiteError> {
        if canonical_name(type_name) == self.name {
            debug!("{}: ignoring reference to itself", self.name);
            return Ok(());
        }

        let registry = Rc::clone(&ctx.registry);
        if let Err(e) = registry.reload(type_name, ctx) {
            debug!("{}", e);
        }

        let mut child = match construct_isolated(&*registry, type_name, ctx) {
            Ok(child) => child,
            Err(e) => {
                let e = e.into_construction(type_name);
                warn!("{}", e);
                return Err(e);
            }
        };

        child.set_level(self.level + 1);
        if let Some(method) = method {
            child.restrict_to(method);
        }
        debug!("{}: added {}", self.name, child.name());
        self.children.push(child);
        Ok(())
    }
}

/// Construct through `loader`, turning a panicking constructor into an error
fn construct_isolated(loader: &dyn NodeLoader, identifier: &str, ctx: &NodeContext) -> NodeResult {
    catch_unwind(AssertUnwindSafe(|| loader.construct(identifier, ctx)))
        .unwrap_or_else(|_| Err(SuiteError::construction(identifier, "constructor panicked")))
}

impl TestNode for Suite {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) {
        self.npass = 0;
        self.nfail = 0;
        self.nskip = 0;

        let reporter = Rc::clone(&self.ctx.reporter);
        if !self.ctx.failures_only {
            reporter.report_suite_start(&self.name, self.ntestcases(), self.ntests(), self.level);
        }

        for child in &mut self.children {
            child.run();
            let prop = child.property();
            self.npass += prop.npass;
            self.nfail += prop.nfail;
            self.nskip += prop.nskip;
        }

        if !self.ctx.failures_only {
            reporter.report_suite_result(self.npass, self.nfail, self.nskip, self.level);
        }

        if self.level == 0 {
            info!(
                "{}: {} passed, {} failed, {} skipped",
                self.name, self.npass, self.nfail, self.nskip
            );
        }
    }

    fn display(&self) {
        if self.nfail == 0 {
            return;
        }
        let reporter = &self.ctx.reporter;
        reporter.report_suite_start(&self.name, self.ntestcases(), self.ntests(), self.level);
        for child in &self.children {
            child.display();
        }
        reporter.report_suite_result(self.npass, self.nfail, self.nskip, self.level);
    }

    fn set_level(&mut self, level: usize) {
        self.level = level;
        for child in &mut self.children {
            child.set_level(level + 1);
        }
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
            ntestcases: self.ntestcases(),
        }
    }

    fn children(&self) -> &[Box<dyn TestNode>] {
        &self.children
    }

    fn is_leaf(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{ScriptLoader, TestCase, TestFailure};
    use crate::registry::TestRegistry;
    use crate::suite::DiscoveryConventions;
    use crate::test_support::{context, context_with, Event, RecordingRunner};
    use std::fs;
    use tempfile::tempdir;

    /// X: 2 pass. Y: 1 pass, 1 fail, 1 skip.
    fn scenario_registry() -> TestRegistry {
        let mut registry = TestRegistry::new();
        registry.register("x_ut", |ctx| {
            Ok(Box::new(
                TestCase::new("x_ut", ctx)
                    .test("a", || Ok(()))
                    .test("b", || Ok(())),
            ))
        });
        registry.register("y_ut", |ctx| {
            Ok(Box::new(
                TestCase::new("y_ut", ctx)
                    .test("a", || Ok(()))
                    .test("b", || Err("wrong".into()))
                    .test("c", || Err(TestFailure::skip("later"))),
            ))
        });
        registry.register("bad_ut", |_| Err(SuiteError::construction("bad_ut", "no such fixture")));
        registry.register("panicky_ut", |_| panic!("constructor exploded"));
        registry
    }

    fn scenario() -> (Suite, Rc<RecordingRunner>) {
        let (ctx, runner) = context_with(scenario_registry());
        let mut suite = Suite::new("root", ctx);
        assert!(suite.add(&["x_ut", "y_ut"]).is_empty());
        (suite, runner)
    }

    fn child_names(suite: &Suite) -> Vec<String> {
        suite
            .children()
            .iter()
            .map(|child| child.name().to_string())
            .collect()
    }

    fn leaf(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    const ONE_TEST: &str = "tests:\n  - name: one\n    command: [\"true\"]\n";

    fn script_suite(home: &Path) -> (Suite, Rc<RecordingRunner>) {
        let registry = TestRegistry::new().with_fallback(ScriptLoader::new());
        let (ctx, runner) = context_with(registry);
        let ctx = ctx
            .with_conventions(DiscoveryConventions::default())
            .at_home(home);
        (Suite::new("root", ctx), runner)
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (mut suite, runner) = scenario();
        suite.run();

        let prop = suite.property();
        assert_eq!((prop.npass, prop.nfail, prop.nskip), (3, 1, 1));
        assert_eq!(prop.ntests, 5);
        assert_eq!(prop.ntestcases, 2);

        let events = runner.events();
        assert_eq!(
            events.first(),
            Some(&Event::SuiteStart {
                name: "root".into(),
                ntestcases: 2,
                ntests: 5,
                level: 0
            })
        );
        assert_eq!(
            events.last(),
            Some(&Event::SuiteResult {
                npass: 3,
                nfail: 1,
                nskip: 1,
                level: 0
            })
        );
    }

    #[test]
    fn test_counts_partition_tests() {
        let (mut suite, _) = scenario();
        let (ctx, _) = context_with(scenario_registry());
        let mut nested = Suite::new("nested", ctx);
        nested.add(&["y_ut", "x_ut.a"]);
        suite.push(Box::new(nested));

        suite.run();
        let prop = suite.property();
        assert_eq!(prop.nrun(), prop.ntests);
        for child in suite.children() {
            let p = child.property();
            assert_eq!(p.nrun(), p.ntests);
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let (mut suite, _) = scenario();
        suite.run();
        let first = suite.property();
        suite.run();
        assert_eq!(suite.property(), first);
    }

    #[test]
    fn test_construction_failures_are_isolated() {
        let (ctx, _) = context_with(scenario_registry());
        let mut suite = Suite::new("root", ctx);
        let failures = suite.add(&["x_ut", "bad_ut", "panicky_ut", "unknown_ut", "y_ut"]);

        assert_eq!(child_names(&suite), vec!["x_ut", "y_ut"]);
        assert_eq!(failures.len(), 3);
        assert!(failures
            .iter()
            .all(|e| matches!(e, SuiteError::Construction { .. })));
        assert_eq!(failures[1].identifier(), Some("panicky_ut"));
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let (ctx, _) = context_with(scenario_registry());
        let mut suite = Suite::new("X_UT", ctx);
        let failures = suite.add(&["x_ut", "X_UT.a"]);
        assert!(failures.is_empty());
        assert_eq!(suite.ntestcases(), 0);
    }

    #[test]
    fn test_method_qualifier_restricts_case() {
        let (ctx, _) = context_with(scenario_registry());
        let mut suite = Suite::new("root", ctx);
        suite.add(&["y_ut.b"]);
        assert_eq!(suite.ntests(), 1);
        suite.run();
        assert_eq!(suite.property().nfail, 1);
        assert_eq!(suite.property().npass, 0);
    }

    #[test]
    fn test_set_level_propagates_depth() {
        let (ctx, _) = context_with(scenario_registry());
        let mut inner = Suite::new("inner", ctx.clone());
        inner.add(&["x_ut"]);
        let mut middle = Suite::new("middle", ctx.clone());
        middle.push(Box::new(inner));
        let mut root = Suite::new("root", ctx);
        root.add(&["y_ut"]);
        root.push(Box::new(middle));

        root.set_level(3);

        fn check(node: &dyn TestNode, expected: usize) {
            assert_eq!(node.level(), expected, "{}", node.name());
            for child in node.children() {
                check(child.as_ref(), expected + 1);
            }
        }
        check(&root, 3);
        assert_eq!(root.children()[1].children()[0].children()[0].level(), 6);
    }

    #[test]
    fn test_display_only_reports_failures() {
        let (ctx, runner) = context_with(scenario_registry());
        let ctx = ctx.with_failures_only(true);
        let mut suite = Suite::new("root", ctx.clone());
        suite.add(&["x_ut", "y_ut"]);
        suite.run();
        assert!(runner.is_empty());

        suite.display();
        let events = runner.events();
        let cases: Vec<&Event> = events
            .iter()
            .filter(|e| matches!(e, Event::CaseStart { .. }))
            .collect();
        assert_eq!(cases.len(), 1);
        assert!(matches!(cases[0], Event::CaseStart { name, level: 1, .. } if name == "y_ut"));
        assert!(matches!(events[0], Event::SuiteStart { level: 0, .. }));
    }

    #[test]
    fn test_display_is_silent_without_failures() {
        let (ctx, runner) = context_with(scenario_registry());
        let mut suite = Suite::new("root", ctx.with_failures_only(true));
        suite.add(&["x_ut"]);
        suite.run();
        suite.display();
        assert!(runner.is_empty());

        let (ctx, runner) = context();
        let empty = Suite::new("empty", ctx);
        empty.display();
        assert!(runner.is_empty());
    }

    #[test]
    fn test_home_is_normalized() {
        let (ctx, _) = context();
        let suite = Suite::new("root", ctx.at_home("tests/unit"));
        assert!(suite
            .home()
            .to_string_lossy()
            .ends_with(std::path::MAIN_SEPARATOR));
        assert_eq!(suite.context().home.as_path(), suite.home());
    }

    #[test]
    fn test_for_type_uses_canonical_name() {
        struct ArithmeticUts;
        let (ctx, _) = context();
        let suite = Suite::for_type::<ArithmeticUts>(ctx);
        assert_eq!(suite.name(), "arithmeticuts");
        assert_eq!(suite.level(), 0);
        assert_eq!(suite.ntestcases(), 0);
    }

    #[test]
    fn test_discovery_builds_filesystem_tree() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        leaf(&home.join("b_ut.yaml"), ONE_TEST);
        leaf(&home.join("a_ut.yaml"), ONE_TEST);
        leaf(&home.join("readme.txt"), "not a test");

        fs::create_dir(home.join("strings")).unwrap();
        leaf(&home.join("strings/trim_ut.yaml"), ONE_TEST);

        fs::create_dir(home.join("empty")).unwrap();
        fs::create_dir_all(home.join("deep/deeper")).unwrap();
        leaf(&home.join("deep/deeper/lost_ut.yaml"), ONE_TEST);

        let (mut suite, _) = script_suite(home);
        let failures = suite.add_all();
        assert!(failures.is_empty(), "{failures:?}");

        assert_eq!(child_names(&suite), vec!["a_ut", "b_ut", "strings"]);
        let strings = &suite.children()[2];
        assert_eq!(strings.level(), 1);
        assert_eq!(strings.children()[0].name(), "trim_ut");
        assert_eq!(strings.children()[0].level(), 2);

        suite.run();
        assert_eq!(suite.property().npass, 3);
        assert_eq!(suite.property().ntests, 3);
    }

    #[test]
    fn test_declared_suite_takes_precedence() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        fs::create_dir(home.join("math")).unwrap();
        leaf(&home.join("math/add_ut.yaml"), ONE_TEST);
        leaf(&home.join("math/sub_ut.yaml"), ONE_TEST);
        leaf(&home.join("math/math_uts.yaml"), "children: [add_ut]\n");

        let (mut suite, _) = script_suite(home);
        assert!(suite.add_all().is_empty());

        assert_eq!(child_names(&suite), vec!["math_uts"]);
        let math = &suite.children()[0];
        assert_eq!(math.children().len(), 1);
        assert_eq!(math.children()[0].name(), "add_ut");
        assert_eq!(math.children()[0].level(), 2);
    }

    #[test]
    fn test_renamed_suite_ignores_its_own_file() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        fs::create_dir(home.join("math")).unwrap();
        leaf(&home.join("math/add_ut.yaml"), ONE_TEST);
        leaf(
            &home.join("math/math_uts.yaml"),
            "name: arithmetic\nchildren: [add_ut, math_uts, MATH_UTS.x]\n",
        );

        let (mut suite, _) = script_suite(home);
        assert!(suite.add_all().is_empty());

        assert_eq!(child_names(&suite), vec!["arithmetic"]);
        let arithmetic = &suite.children()[0];
        assert_eq!(arithmetic.children().len(), 1);
        assert_eq!(arithmetic.children()[0].name(), "add_ut");

        suite.run();
        assert_eq!(suite.property().npass, 1);
    }

    #[test]
    fn test_mutually_referencing_suites_stop_at_the_cycle() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        fs::create_dir(home.join("pair")).unwrap();
        leaf(&home.join("pair/one_ut.yaml"), ONE_TEST);
        leaf(&home.join("pair/a_uts.yaml"), "children: [b_uts, one_ut]\n");
        leaf(&home.join("pair/b_uts.yaml"), "children: [a_uts]\n");

        let (mut suite, _) = script_suite(home);
        assert!(suite.add_all().is_empty());

        assert_eq!(child_names(&suite), vec!["a_uts"]);
        let a = &suite.children()[0];
        let names: Vec<&str> = a.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["b_uts", "one_ut"]);
        assert!(a.children()[0].children().is_empty());

        suite.run();
        assert_eq!(suite.property().ntests, 1);
        assert_eq!(suite.property().npass, 1);
    }

    #[test]
    fn test_discovered_names_keep_the_separator() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        leaf(&home.join("v1.2_ut.yaml"), ONE_TEST);

        let (mut suite, _) = script_suite(home);
        let failures = suite.add_all();
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(child_names(&suite), vec!["v1.2_ut"]);

        suite.run();
        assert_eq!(suite.property().npass, 1);
    }

    #[test]
    fn test_discovery_collects_broken_definitions() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        leaf(&home.join("good_ut.yaml"), ONE_TEST);
        leaf(&home.join("broken_ut.yaml"), "tests: {oops");
        fs::create_dir(home.join("sub")).unwrap();
        leaf(&home.join("sub/also_broken_ut.yaml"), "tests: [");

        let (mut suite, _) = script_suite(home);
        let failures = suite.add_all();

        assert_eq!(failures.len(), 2);
        assert_eq!(child_names(&suite), vec!["good_ut", "sub"]);
        assert_eq!(suite.children()[1].children().len(), 0);
    }

    #[test]
    fn test_discovery_of_missing_home_is_empty() {
        let (mut suite, _) = script_suite(Path::new("/no/such/test/home"));
        assert!(suite.add_all().is_empty());
        assert_eq!(suite.ntestcases(), 0);
        suite.run();
        assert_eq!(
            suite.property(),
            NodeProperty {
                name: "root".into(),
                ..NodeProperty::default()
            }
        );
    }
}
