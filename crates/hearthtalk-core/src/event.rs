//! Event types published by the conversation agent.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Event name for [`AgentEvent::ConversationFinished`], as seen by external
/// consumers (automations, loggers).
pub const EVENT_CONVERSATION_FINISHED: &str = "hearthtalk.conversation.finished";

/// Events emitted on the agent event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    /// A conversation turn completed successfully.
    ConversationFinished {
        conversation_id: String,
        /// The original utterance.
        text: String,
        /// Raw response payload from the remote API.
        response: serde_json::Value,
        /// Full message history after the turn.
        messages: Vec<Message>,
    },
}

impl AgentEvent {
    /// External event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConversationFinished { .. } => EVENT_CONVERSATION_FINISHED,
        }
    }
}

/// Metadata attached to every published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event ID.
    pub id: String,
    /// Component that published the event.
    pub source: String,
    /// Publish timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}
