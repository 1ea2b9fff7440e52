//! Test type registry
//!
//! Test types are constructed by identifier. Compiled types register a
//! factory; anything else is handed to an optional fallback loader such as
//! the script loader, which reads definitions from disk.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::SuiteError;
use crate::models::{canonical_name, NodeContext, TestNode};

/// Result of constructing a node
pub type NodeResult = Result<Box<dyn TestNode>, SuiteError>;

/// Factory building a node from its construction context
pub type NodeFactory = Box<dyn Fn(&NodeContext) -> NodeResult>;

/// Resolves identifiers into freshly constructed nodes
pub trait NodeLoader {
    /// Refresh the resident definition of `identifier` before construction.
    ///
    /// Errors are advisory: callers keep using whatever definition is resident.
    fn reload(&self, _identifier: &str, _ctx: &NodeContext) -> Result<(), SuiteError> {
        Ok(())
    }

    /// Build a new node of type `identifier`
    fn construct(&self, identifier: &str, ctx: &NodeContext) -> NodeResult;
}

/// Identifier-keyed map of node factories
#[derive(Default)]
pub struct TestRegistry {
    factories: HashMap<String, NodeFactory>,
    fallback: Option<Box<dyn NodeLoader>>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve identifiers without a factory through `loader`
    pub fn with_fallback(mut self, loader: impl NodeLoader + 'static) -> Self {
        self.fallback = Some(Box::new(loader));
        self
    }

    /// Register a factory; identifiers are case-insensitive
    pub fn register<F>(&mut self, identifier: &str, factory: F) -> &mut Self
    where
        F: Fn(&NodeContext) -> NodeResult + 'static,
    {
        let key = canonical_name(identifier);
        if self.factories.insert(key.clone(), Box::new(factory)).is_some() {
            debug!("Replaced factory for {}", key);
        }
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(&canonical_name(identifier))
    }

    /// Registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl NodeLoader for TestRegistry {
    fn reload(&self, identifier: &str, ctx: &NodeContext) -> Result<(), SuiteError> {
        // Compiled factories cannot go stale within a process.
        if self.contains(identifier) {
            return Ok(());
        }
        match &self.fallback {
            Some(loader) => loader.reload(identifier, ctx),
            None => Ok(()),
        }
    }

    fn construct(&self, identifier: &str, ctx: &NodeContext) -> NodeResult {
        if let Some(factory) = self.factories.get(&canonical_name(identifier)) {
            return factory(ctx);
        }
        match &self.fallback {
            Some(loader) => loader.construct(identifier, ctx),
            None => Err(SuiteError::UnknownType(identifier.to_string())),
        }
    }
}

impl fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRegistry")
            .field("identifiers", &self.identifiers())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
