//! Function executor trait and per-turn execution context.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use hearthtalk_core::entity::ExposedEntity;
use hearthtalk_core::hub::{EntityRegistry, ServiceRegistry};

use crate::error::{FunctionError, Result};

/// Per-turn context handed to executors.
///
/// `exposed` is the snapshot taken at the start of the turn. It is the
/// authorization boundary: executors must not act on entities outside it.
pub struct FunctionContext<'a> {
    pub entities: &'a dyn EntityRegistry,
    pub services: &'a dyn ServiceRegistry,
    pub exposed: &'a [ExposedEntity],
}

impl<'a> FunctionContext<'a> {
    pub fn new(
        entities: &'a dyn EntityRegistry,
        services: &'a dyn ServiceRegistry,
        exposed: &'a [ExposedEntity],
    ) -> Self {
        Self {
            entities,
            services,
            exposed,
        }
    }

    /// Authorize a set of entity IDs for this turn.
    ///
    /// Every ID must exist in hub state (checked first) and be a member of
    /// the exposed set.
    pub fn validate_entity_ids(&self, entity_ids: &[String]) -> Result<()> {
        let missing: Vec<String> = entity_ids
            .iter()
            .filter(|id| !self.entities.entity_exists(id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(FunctionError::EntityNotFound { ids: missing });
        }

        let unexposed: Vec<String> = entity_ids
            .iter()
            .filter(|id| !self.exposed.iter().any(|e| &e.entity_id == *id))
            .cloned()
            .collect();
        if !unexposed.is_empty() {
            return Err(FunctionError::EntityNotExposed { ids: unexposed });
        }
        Ok(())
    }
}

/// A model-invocable function bound to a name.
#[async_trait]
pub trait FunctionExecutor: Send + Sync {
    /// Name the model uses to invoke this function.
    fn name(&self) -> &str;

    /// Execute with the model-supplied arguments.
    async fn execute(&self, args: Value, ctx: &FunctionContext<'_>) -> Result<Value>;
}

/// Shared executor handle.
pub type DynExecutor = Arc<dyn FunctionExecutor>;
