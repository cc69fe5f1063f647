//! Conversation identity, history, and the in-memory history store.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::message::{Message, MessageRole};

/// Opaque identifier correlating the turns of one conversation.
///
/// Minted once when a conversation starts and stable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Mint a new random conversation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation and its ordered message history.
///
/// Invariant: the first message, when present, is the system message
/// generated at conversation start. It is never regenerated on later turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// Ordered message history.
    pub messages: Vec<Message>,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update timestamp.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Conversation {
    /// Create an empty conversation with a fresh ID.
    pub fn new() -> Self {
        Self::with_id(ConversationId::new())
    }

    /// Create an empty conversation with a specific ID.
    pub fn with_id(id: ConversationId) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = chrono::Utc::now();
    }

    /// Get the message history.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Check whether the history starts with a system message.
    pub fn has_system_seed(&self) -> bool {
        self.messages
            .first()
            .map(|m| m.role == MessageRole::System)
            .unwrap_or(false)
    }

    /// Return the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the conversation has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory store of conversation histories, keyed by conversation ID.
///
/// An explicit object owned by the agent instance rather than process-global
/// state. History does not survive a restart.
///
/// The backing map is sharded ([`DashMap`]), so distinct conversations never
/// contend. For a single conversation the host contract promises serialized
/// turns; hosts that cannot guarantee that must hold the [`turn_guard`]
/// mutex for the full read-modify-write of a turn.
///
/// [`turn_guard`]: ConversationStore::turn_guard
pub struct ConversationStore {
    conversations: DashMap<String, Conversation>,
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            conversations: DashMap::new(),
            turn_locks: DashMap::new(),
        }
    }

    /// Check whether a conversation is known.
    pub fn contains(&self, id: &str) -> bool {
        self.conversations.contains_key(id)
    }

    /// Get a clone of the stored history for `id`.
    pub fn history(&self, id: &str) -> Option<Vec<Message>> {
        self.conversations.get(id).map(|c| c.messages.clone())
    }

    /// Persist `messages` as the full history of `id`.
    ///
    /// Creates the conversation on first save; preserves `created_at`
    /// afterwards.
    pub fn save(&self, id: &str, messages: Vec<Message>) {
        let mut entry = self
            .conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation::with_id(ConversationId::from(id)));
        entry.messages = messages;
        entry.updated_at = chrono::Utc::now();
    }

    /// Remove one conversation. Returns `true` if it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.turn_locks.remove(id);
        self.conversations.remove(id).is_some()
    }

    /// Drop all conversations.
    pub fn clear(&self) {
        self.conversations.clear();
        self.turn_locks.clear();
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Per-conversation mutual-exclusion guard.
    ///
    /// Returns the same mutex for the same ID for as long as the
    /// conversation lives. Hold it across the read-modify-write of a turn
    /// when turns for one conversation may run concurrently.
    pub fn turn_guard(&self, id: &str) -> Arc<Mutex<()>> {
        self.turn_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_is_unique() {
        assert_ne!(ConversationId::new(), ConversationId::new());
    }

    #[test]
    fn test_system_seed() {
        let mut conversation = Conversation::new();
        assert!(!conversation.has_system_seed());

        conversation.add_message(Message::system("You are a smart home manager."));
        conversation.add_message(Message::user("Hello"));
        assert!(conversation.has_system_seed());
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_store_save_and_history() {
        let store = ConversationStore::new();
        assert!(!store.contains("c1"));

        store.save("c1", vec![Message::system("prompt"), Message::user("hi")]);
        assert!(store.contains("c1"));
        assert_eq!(store.history("c1").unwrap().len(), 2);
        assert_eq!(store.len(), 1);

        // History is cloned out; mutating the clone does not touch the store.
        let mut copy = store.history("c1").unwrap();
        copy.push(Message::assistant("hello"));
        assert_eq!(store.history("c1").unwrap().len(), 2);
    }

    #[test]
    fn test_store_remove_and_clear() {
        let store = ConversationStore::new();
        store.save("c1", vec![Message::user("hi")]);
        store.save("c2", vec![Message::user("hi")]);

        assert!(store.remove("c1"));
        assert!(!store.remove("c1"));
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_turn_guard_is_stable_per_id() {
        let store = ConversationStore::new();
        let a = store.turn_guard("c1");
        let b = store.turn_guard("c1");
        let c = store.turn_guard("c2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
