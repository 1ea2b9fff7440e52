//! Filesystem discovery conventions
//!
//! Test types are found by file name: leaf cases end in `case_suffix`,
//! suites in `suite_suffix`, both followed by `definition_extension`.
//! Matching is ASCII case-insensitive and never looks below the directory
//! it is given; recursion is the caller's job.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-naming conventions used to discover test types
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConventions {
    /// Suffix marking a leaf test case type, e.g. `_ut`
    pub case_suffix: String,

    /// Suffix marking a suite type, e.g. `_uts`
    pub suite_suffix: String,

    /// Decoration following the type identifier in a file name
    pub definition_extension: String,

    /// Separates a type identifier from a single test name
    pub method_separator: char,
}

impl Default for DiscoveryConventions {
    fn default() -> Self {
        Self {
            case_suffix: "_ut".to_string(),
            suite_suffix: "_uts".to_string(),
            definition_extension: ".yaml".to_string(),
            method_separator: '.',
        }
    }
}

impl DiscoveryConventions {
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.definition_extension = extension.into();
        self
    }

    fn matches(&self, file_name: &str, suffix: &str) -> bool {
        let pattern = format!("{suffix}{}", self.definition_extension).to_ascii_lowercase();
        let lower = file_name.to_ascii_lowercase();
        lower.len() > pattern.len() && lower.ends_with(&pattern)
    }

    pub fn is_case_file(&self, file_name: &str) -> bool {
        self.matches(file_name, &self.case_suffix)
    }

    pub fn is_suite_file(&self, file_name: &str) -> bool {
        self.matches(file_name, &self.suite_suffix)
    }

    /// Whether a bare identifier names a suite type
    pub fn is_suite_identifier(&self, identifier: &str) -> bool {
        identifier
            .to_ascii_lowercase()
            .ends_with(&self.suite_suffix.to_ascii_lowercase())
    }

    /// Whether a bare identifier names a leaf case type
    pub fn is_case_identifier(&self, identifier: &str) -> bool {
        identifier
            .to_ascii_lowercase()
            .ends_with(&self.case_suffix.to_ascii_lowercase())
    }

    /// Drop the definition extension, leaving the type identifier
    pub fn strip_definition<'a>(&self, file_name: &'a str) -> &'a str {
        let cut = file_name
            .len()
            .saturating_sub(self.definition_extension.len());
        file_name.get(..cut).unwrap_or(file_name)
    }

    /// File name holding the definition of `identifier`
    pub fn definition_file(&self, identifier: &str) -> String {
        format!("{identifier}{}", self.definition_extension)
    }

    /// Split `type.method` into its parts; no separator means every test
    pub fn split_qualifier<'a>(&self, identifier: &'a str) -> (&'a str, Option<&'a str>) {
        match identifier.split_once(self.method_separator) {
            Some((type_name, method)) if !method.is_empty() => (type_name, Some(method)),
            Some((type_name, _)) => (type_name, None),
            None => (identifier, None),
        }
    }
}

/// Sorted file names directly under `dir`; unreadable directories yield none
fn file_names(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Leaf case identifiers defined directly in `dir`, in file-name order
pub fn case_identifiers(dir: &Path, conventions: &DiscoveryConventions) -> Vec<String> {
    file_names(dir)
        .into_iter()
        .filter(|name| conventions.is_case_file(name))
        .map(|name| conventions.strip_definition(&name).to_string())
        .collect()
}

/// Identifier of the suite declared in `dir`, if any
///
/// With several suite files the first in name order wins.
pub fn suite_identifier(dir: &Path, conventions: &DiscoveryConventions) -> Option<String> {
    file_names(dir)
        .into_iter()
        .find(|name| conventions.is_suite_file(name))
        .map(|name| conventions.strip_definition(&name).to_string())
}

/// Immediate subdirectories of `dir`, sorted
pub fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs
}

/// Locate the definition file for `identifier` in `dir`, ignoring ASCII case
pub fn definition_path(
    dir: &Path,
    identifier: &str,
    conventions: &DiscoveryConventions,
) -> Option<PathBuf> {
    let wanted = conventions.definition_file(identifier).to_ascii_lowercase();
    file_names(dir)
        .into_iter()
        .find(|name| name.to_ascii_lowercase() == wanted)
        .map(|name| dir.join(name))
}

/// Guarantee the directory path ends with a separator
pub fn normalize_home(home: &Path) -> PathBuf {
    let mut normalized = home.to_path_buf();
    let ends_with_separator = normalized
        .as_os_str()
        .to_string_lossy()
        .chars()
        .last()
        .map(std::path::is_separator);
    if ends_with_separator == Some(false) {
        normalized.push("");
    }
    normalized
}
