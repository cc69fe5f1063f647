//! Name-keyed registry of function executors.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{FunctionError, Result};
use crate::executor::{DynExecutor, FunctionContext};
use crate::service_call::ServiceCallExecutor;

/// Registry mapping function names to executors.
///
/// Resolved once at startup; dispatch is a plain map lookup. An unknown
/// name fails [`FunctionError::NotFound`] here, distinct from the
/// unknown-service failure inside the service executor.
pub struct ExecutorRegistry {
    executors: HashMap<String, DynExecutor>,
}

impl ExecutorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in executors registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ServiceCallExecutor));
        registry
    }

    /// Register an executor under its name.
    pub fn register(&mut self, executor: DynExecutor) {
        self.executors.insert(executor.name().to_string(), executor);
    }

    /// Check if a function is registered.
    pub fn has(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    /// Registered function names.
    pub fn names(&self) -> Vec<String> {
        self.executors.keys().cloned().collect()
    }

    /// Dispatch a function call by name.
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        ctx: &FunctionContext<'_>,
    ) -> Result<Value> {
        let executor = self
            .executors
            .get(name)
            .ok_or_else(|| FunctionError::NotFound(name.to_string()))?;
        executor.execute(args, ctx).await
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
