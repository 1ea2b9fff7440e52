//! File-backed test definitions
//!
//! Cases and suites described in YAML (or JSON) files next to the tests they
//! drive. Each case test runs a command in the definition's directory.
//!
//! ```yaml
//! # math_ut.yaml
//! tests:
//!   - name: adds
//!     command: ["sh", "-c", "test $((1 + 1)) -eq 2"]
//!   - name: prints_version
//!     command: ["mytool", "--version"]
//!     expect_stdout: "mytool 1."
//!   - name: slow
//!     command: ["./bench.sh"]
//!     skip: "too slow for CI"
//! ```
//!
//! ```yaml
//! # all_uts.yaml
//! children: [math_ut, strings_ut.trims]
//! discover: false
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::{TestCase, TestFailure, TestResult};
use crate::error::SuiteError;
use crate::models::{canonical_name, NodeContext};
use crate::registry::{NodeLoader, NodeResult};
use crate::suite::{definition_path, DiscoveryConventions, Suite};

/// One command-driven test
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTest {
    pub name: String,

    /// Program followed by its arguments
    pub command: Vec<String>,

    #[serde(default)]
    pub expect_status: i32,

    /// Substring the standard output must contain
    #[serde(default)]
    pub expect_stdout: Option<String>,

    /// Reason to skip the test instead of running it
    #[serde(default)]
    pub skip: Option<String>,
}

impl ScriptTest {
    /// Run the command inside `dir`
    pub fn execute(&self, dir: &Path) -> TestResult {
        if let Some(reason) = &self.skip {
            return Err(TestFailure::skip(reason.clone()));
        }

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| TestFailure::fail("empty command"))?;

        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| TestFailure::fail(format!("cannot run {program}: {e}")))?;

        if output.status.code() != Some(self.expect_status) {
            let status = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut message = format!(
                "exit status {status}, expected {}",
                self.expect_status
            );
            if let Some(last) = stderr.lines().last() {
                message.push_str(&format!(": {}", last.trim()));
            }
            return Err(TestFailure::Fail(message));
        }

        if let Some(expected) = &self.expect_stdout {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.contains(expected.as_str()) {
                return Err(TestFailure::Fail(format!(
                    "stdout does not contain \"{expected}\""
                )));
            }
        }

        Ok(())
    }
}

/// Leaf case definition
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDefinition {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub tests: Vec<ScriptTest>,
}

/// Suite definition
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteDefinition {
    #[serde(default)]
    pub name: Option<String>,

    /// Identifiers registered explicitly, in order
    #[serde(default)]
    pub children: Vec<String>,

    /// Also populate from the definition's directory
    #[serde(default)]
    pub discover: bool,
}

/// Parsed definition file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Definition {
    Case(CaseDefinition),
    Suite(SuiteDefinition),
}

impl Definition {
    /// Parse `path`; the identifier's suffix decides between suite and case
    pub fn load(
        path: &Path,
        identifier: &str,
        conventions: &DiscoveryConventions,
    ) -> Result<Self, SuiteError> {
        let content = std::fs::read_to_string(path)?;
        let invalid = |message: String| SuiteError::Definition {
            path: path.to_path_buf(),
            message,
        };

        if conventions.is_suite_identifier(identifier) {
            parse::<SuiteDefinition>(path, &content)
                .map(Definition::Suite)
                .map_err(invalid)
        } else if conventions.is_case_identifier(identifier) {
            parse::<CaseDefinition>(path, &content)
                .map(Definition::Case)
                .map_err(invalid)
        } else {
            Err(invalid(format!(
                "'{identifier}' ends in neither {} nor {}",
                conventions.case_suffix, conventions.suite_suffix
            )))
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path, content: &str) -> Result<T, String> {
    if is_json_file(path) {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

/// Loader building nodes from definition files in the context's home
///
/// Parsed definitions stay resident. A reload that fails leaves the previous
/// definition in place, so a broken edit does not drop a test from the tree.
#[derive(Debug, Default)]
pub struct ScriptLoader {
    resident: RefCell<HashMap<(PathBuf, String), Definition>>,
}

impl ScriptLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(identifier: &str, ctx: &NodeContext) -> (PathBuf, String) {
        (ctx.home.clone(), canonical_name(identifier))
    }

    /// Definition currently resident for `identifier` in `ctx.home`
    pub fn resident(&self, identifier: &str, ctx: &NodeContext) -> Option<Definition> {
        self.resident
            .borrow()
            .get(&Self::key(identifier, ctx))
            .cloned()
    }

    fn build_case(&self, identifier: &str, definition: CaseDefinition, ctx: &NodeContext) -> NodeResult {
        let name = definition.name.as_deref().unwrap_or(identifier);
        let mut case = TestCase::new(name, ctx);
        for test in definition.tests {
            let dir = ctx.home.clone();
            let test_name = test.name.clone();
            case.add_test(test_name, move || test.execute(&dir));
        }
        Ok(Box::new(case))
    }

    fn build_suite(&self, identifier: &str, definition: SuiteDefinition, ctx: &NodeContext) -> NodeResult {
        let name = definition.name.as_deref().unwrap_or(identifier);
        let mut suite = Suite::new(name, ctx.building(identifier));

        // A renamed suite still must not list its own file.
        let own = canonical_name(identifier);
        let children: Vec<&String> = definition
            .children
            .iter()
            .filter(|child| {
                let (type_name, _) = ctx.conventions.split_qualifier(child);
                let keep = canonical_name(type_name) != own;
                if !keep {
                    debug!("{}: ignoring reference to its own definition", suite.name());
                }
                keep
            })
            .collect();
        let mut failures = suite.add(&children);
        if definition.discover {
            failures.extend(suite.add_all());
        }
        if !failures.is_empty() {
            debug!("{} built with {} missing children", suite.name(), failures.len());
        }
        Ok(Box::new(suite))
    }
}

impl NodeLoader for ScriptLoader {
    fn reload(&self, identifier: &str, ctx: &NodeContext) -> Result<(), SuiteError> {
        let path = definition_path(&ctx.home, identifier, &ctx.conventions).ok_or_else(|| {
            SuiteError::reload(
                identifier,
                format!(
                    "no {} in {}",
                    ctx.conventions.definition_file(identifier),
                    ctx.home.display()
                ),
            )
        })?;

        let definition = Definition::load(&path, identifier, &ctx.conventions)
            .map_err(|e| SuiteError::reload(identifier, e.to_string()))?;

        debug!("Loaded definition {}", path.display());
        self.resident
            .borrow_mut()
            .insert(Self::key(identifier, ctx), definition);
        Ok(())
    }

    fn construct(&self, identifier: &str, ctx: &NodeContext) -> NodeResult {
        if ctx.is_building(identifier) {
            return Err(SuiteError::construction(
                identifier,
                "definition includes itself through its children",
            ));
        }

        let definition = match self.resident(identifier, ctx) {
            Some(definition) => definition,
            None => {
                self.reload(identifier, ctx)
                    .map_err(|e| SuiteError::construction(identifier, e.to_string()))?;
                self.resident(identifier, ctx).ok_or_else(|| {
                    SuiteError::construction(identifier, "definition not resident")
                })?
            }
        };

        match definition {
            Definition::Case(case) => self.build_case(identifier, case, ctx),
            Definition::Suite(suite) => self.build_suite(identifier, suite, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TestRegistry;
    use crate::test_support::context_with;
    use std::fs;
    use tempfile::tempdir;

    fn script_context(home: &Path) -> NodeContext {
        let registry = TestRegistry::new().with_fallback(ScriptLoader::new());
        let (ctx, _) = context_with(registry);
        ctx.with_conventions(DiscoveryConventions::default())
            .at_home(home)
    }

    #[test]
    fn test_load_case_definition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("math_ut.yaml");
        fs::write(
            &path,
            "tests:\n  - name: adds\n    command: [\"true\"]\n  - name: later\n    command: []\n    skip: not yet\n",
        )
        .unwrap();

        let def = Definition::load(&path, "math_ut", &DiscoveryConventions::default()).unwrap();
        match def {
            Definition::Case(case) => {
                assert_eq!(case.tests.len(), 2);
                assert_eq!(case.tests[0].expect_status, 0);
                assert_eq!(case.tests[1].skip.as_deref(), Some("not yet"));
            }
            other => panic!("expected a case, got {other:?}"),
        }
    }

    #[test]
    fn test_load_suite_definition_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("all_uts.json");
        fs::write(&path, r#"{"children": ["a_ut", "b_ut.one"], "discover": true}"#).unwrap();

        let conventions = DiscoveryConventions::default().with_extension(".json");
        let def = Definition::load(&path, "all_uts", &conventions).unwrap();
        assert_eq!(
            def,
            Definition::Suite(SuiteDefinition {
                name: None,
                children: vec!["a_ut".into(), "b_ut.one".into()],
                discover: true,
            })
        );
    }

    #[test]
    fn test_invalid_definition_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad_ut.yaml");
        fs::write(&path, "tests: [[[").unwrap();
        let err = Definition::load(&path, "bad_ut", &DiscoveryConventions::default()).unwrap_err();
        assert!(matches!(err, SuiteError::Definition { .. }));
    }

    #[test]
    fn test_reload_keeps_resident_definition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edit_ut.yaml");
        fs::write(&path, "tests:\n  - name: one\n    command: [\"true\"]\n").unwrap();

        let ctx = script_context(dir.path());
        let loader = ScriptLoader::new();
        loader.reload("edit_ut", &ctx).unwrap();

        fs::write(&path, "tests: {broken").unwrap();
        assert!(matches!(
            loader.reload("edit_ut", &ctx),
            Err(SuiteError::Reload { .. })
        ));

        let node = loader.construct("edit_ut", &ctx).unwrap();
        assert_eq!(node.property().ntests, 1);
    }

    #[test]
    fn test_reload_picks_up_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grow_ut.yaml");
        fs::write(&path, "tests:\n  - name: one\n    command: [\"true\"]\n").unwrap();

        let ctx = script_context(dir.path());
        let loader = ScriptLoader::new();
        assert_eq!(loader.construct("grow_ut", &ctx).unwrap().property().ntests, 1);

        fs::write(
            &path,
            "tests:\n  - name: one\n    command: [\"true\"]\n  - name: two\n    command: [\"true\"]\n",
        )
        .unwrap();
        loader.reload("grow_ut", &ctx).unwrap();
        assert_eq!(loader.construct("grow_ut", &ctx).unwrap().property().ntests, 2);
    }

    #[test]
    fn test_missing_definition_fails_construction() {
        let dir = tempdir().unwrap();
        let ctx = script_context(dir.path());
        let err = ScriptLoader::new().construct("ghost_ut", &ctx).err().unwrap();
        assert!(matches!(err, SuiteError::Construction { .. }));
    }

    #[test]
    fn test_definition_in_progress_is_not_rebuilt() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("loop_uts.yaml"), "children: []\n").unwrap();

        let ctx = script_context(dir.path());
        let loader = ScriptLoader::new();
        assert!(loader.construct("loop_uts", &ctx).is_ok());

        let err = loader
            .construct("loop_uts", &ctx.building("loop_uts"))
            .err()
            .unwrap();
        assert!(matches!(err, SuiteError::Construction { .. }));
    }

    #[test]
    fn test_script_tests_run_commands() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("cmd_ut.yaml"),
            concat!(
                "tests:\n",
                "  - name: ok\n    command: [\"sh\", \"-c\", \"echo hello\"]\n    expect_stdout: hello\n",
                "  - name: status\n    command: [\"sh\", \"-c\", \"exit 3\"]\n",
                "  - name: expected_status\n    command: [\"sh\", \"-c\", \"exit 3\"]\n    expect_status: 3\n",
                "  - name: skipped\n    command: [\"sh\"]\n    skip: manual\n",
            ),
        )
        .unwrap();

        let ctx = script_context(dir.path());
        let mut node = ScriptLoader::new().construct("cmd_ut", &ctx).unwrap();
        node.run();

        let prop = node.property();
        assert_eq!((prop.npass, prop.nfail, prop.nskip), (2, 1, 1));
    }

    #[test]
    fn test_empty_command_fails() {
        let test = ScriptTest {
            name: "empty".into(),
            command: Vec::new(),
            expect_status: 0,
            expect_stdout: None,
            skip: None,
        };
        assert_eq!(
            test.execute(Path::new(".")),
            Err(TestFailure::fail("empty command"))
        );
    }
}
