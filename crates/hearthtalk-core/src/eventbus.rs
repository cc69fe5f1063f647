//! Event bus for notifying external consumers of agent activity.
//!
//! A thin wrapper around a tokio broadcast channel. Publishing never blocks;
//! events published with no subscribers are discarded.

use tokio::sync::broadcast;

use crate::event::{AgentEvent, EventMetadata};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast bus for [`AgentEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<(AgentEvent, EventMetadata)>,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the specified capacity.
    ///
    /// The capacity bounds how many events are buffered for slow subscribers.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Get the number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event. Returns `true` if at least one subscriber received it.
    pub fn publish(&self, event: AgentEvent, source: impl Into<String>) -> bool {
        let metadata = EventMetadata::new(source);
        self.tx.send((event, metadata)).is_ok()
    }

    /// Subscribe to all events.
    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of the event bus.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<(AgentEvent, EventMetadata)>,
}

impl EventBusReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` when the bus is closed. A lagging receiver skips the
    /// dropped events and continues with the next buffered one.
    pub async fn recv(&mut self) -> Option<(AgentEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&mut self) -> Option<(AgentEvent, EventMetadata)> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe_roundtrip() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let delivered = bus.publish(
            AgentEvent::ConversationFinished {
                conversation_id: "c1".to_string(),
                text: "turn on the light".to_string(),
                response: serde_json::json!({"id": "msg_1"}),
                messages: vec![],
            },
            "agent",
        );
        assert!(delivered);

        let (event, metadata) = rx.recv().await.unwrap();
        assert_eq!(event.name(), crate::event::EVENT_CONVERSATION_FINISHED);
        assert_eq!(metadata.source, "agent");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_discarded() {
        let bus = EventBus::new();
        let delivered = bus.publish(
            AgentEvent::ConversationFinished {
                conversation_id: "c1".to_string(),
                text: String::new(),
                response: serde_json::Value::Null,
                messages: vec![],
            },
            "agent",
        );
        assert!(!delivered);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
