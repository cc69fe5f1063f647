//! Config-entry lifecycle: credential validation, agent setup, unload.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{error, info};

use hearthtalk_core::eventbus::EventBus;
use hearthtalk_core::hub::{EntityRegistry, ServiceRegistry};
use hearthtalk_core::options::{AgentOptions, OptionsError};
use hearthtalk_llm::{ChatClient, ChatClientConfig, ChatError, CredentialError};

use crate::agent::ConversationAgent;

/// Setup failure for a config entry.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The credential was rejected; setup must not proceed.
    #[error("invalid credential: {0}")]
    InvalidAuth(#[source] CredentialError),

    /// The API is unreachable right now; setup may be retried later.
    #[error("chat API not ready: {0}")]
    NotReady(#[source] CredentialError),

    /// Option values out of range.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// The HTTP client could not be constructed.
    #[error(transparent)]
    Client(#[from] ChatError),
}

impl SetupError {
    /// Whether the host should retry setup later instead of failing it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }
}

/// Configured agents keyed by config-entry id.
pub struct EntryRegistry {
    entries: DashMap<String, Arc<ConversationAgent>>,
    bus: EventBus,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            bus: EventBus::new(),
        }
    }

    /// Bus that all agents set up through this registry publish on.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Validate the credential and set up an agent under `entry_id`.
    ///
    /// The credential is probed before any agent state is created: a
    /// rejected key blocks setup, an unreachable API defers it.
    pub async fn setup_entry(
        &self,
        entry_id: &str,
        client_config: ChatClientConfig,
        options: AgentOptions,
        entities: Arc<dyn EntityRegistry>,
        services: Arc<dyn ServiceRegistry>,
    ) -> Result<Arc<ConversationAgent>, SetupError> {
        options.validate()?;

        let client = ChatClient::new(client_config)?;
        client.validate_credentials().await.map_err(|err| {
            error!(entry_id, error = %err, "credential validation failed");
            match err {
                CredentialError::InvalidAuth(_) => SetupError::InvalidAuth(err),
                CredentialError::CannotConnect(_) => SetupError::NotReady(err),
            }
        })?;

        let agent = Arc::new(
            ConversationAgent::new(client, entities, services)
                .with_options(options)
                .with_event_bus(self.bus.clone()),
        );
        self.entries.insert(entry_id.to_string(), agent.clone());
        info!(entry_id, "conversation agent configured");
        Ok(agent)
    }

    /// Agent configured under `entry_id`, if any.
    pub fn agent(&self, entry_id: &str) -> Option<Arc<ConversationAgent>> {
        self.entries.get(entry_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Unload an entry, dropping its agent and in-memory history.
    /// Returns `true` if the entry existed.
    pub fn unload_entry(&self, entry_id: &str) -> bool {
        let removed = self.entries.remove(entry_id).is_some();
        if removed {
            info!(entry_id, "conversation agent unloaded");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
