//! Error types for suite construction and discovery
//!
//! Test failures never travel through these errors; they are counted in
//! `nfail`. These cover the ways building a tree can go wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, loading or constructing test nodes
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Instantiating a named test type failed
    #[error("failed to construct '{identifier}': {message}")]
    Construction { identifier: String, message: String },

    /// Refreshing a type's definition failed; the resident one stays in use
    #[error("failed to reload '{identifier}': {message}")]
    Reload { identifier: String, message: String },

    /// No factory or loader knows the identifier
    #[error("unknown test type '{0}'")]
    UnknownType(String),

    /// A definition file could not be parsed
    #[error("invalid definition {path}: {message}")]
    Definition { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SuiteError {
    pub fn construction(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        SuiteError::Construction {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    pub fn reload(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        SuiteError::Reload {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Fold any error into a `Construction` error for `identifier`
    pub fn into_construction(self, identifier: &str) -> Self {
        match self {
            SuiteError::Construction { .. } => self,
            other => SuiteError::construction(identifier, other.to_string()),
        }
    }

    /// Identifier the error refers to, when it names one
    pub fn identifier(&self) -> Option<&str> {
        match self {
            SuiteError::Construction { identifier, .. } | SuiteError::Reload { identifier, .. } => {
                Some(identifier)
            }
            SuiteError::UnknownType(identifier) => Some(identifier),
            _ => None,
        }
    }
}
