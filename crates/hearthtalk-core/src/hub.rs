//! Host hub collaborator traits.
//!
//! The agent consumes a narrow slice of the hub: entity state/exposure
//! lookups and service invocation. Hosts implement these traits; tests use
//! in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::entity::ExposedEntity;

/// Failure reported by a host call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HubError {
    pub message: String,
}

impl HubError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Entity state and exposure lookups.
pub trait EntityRegistry: Send + Sync {
    /// Entities the user has opted to expose to conversation agents,
    /// with identifier, display name, current state, and aliases.
    fn exposed_entities(&self) -> Vec<ExposedEntity>;

    /// Whether `entity_id` currently exists in hub state at all,
    /// exposed or not.
    fn entity_exists(&self, entity_id: &str) -> bool;
}

/// Service existence checks and invocation.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Whether the `domain.service` pair is registered with the hub.
    fn has_service(&self, domain: &str, service: &str) -> bool;

    /// Invoke a service with the given data payload.
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: Value,
    ) -> Result<(), HubError>;
}
