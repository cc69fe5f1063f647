//! The conversation agent.
//!
//! Implements the host's conversation-agent contract: one `process` call
//! per utterance, returning speech and a conversation id. All remote and
//! dispatch failures are converted into spoken error responses at this
//! boundary; `process` never fails.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use hearthtalk_core::conversation::{ConversationId, ConversationStore};
use hearthtalk_core::entity::ExposedEntity;
use hearthtalk_core::event::AgentEvent;
use hearthtalk_core::eventbus::{EventBus, EventBusReceiver};
use hearthtalk_core::hub::{EntityRegistry, ServiceRegistry};
use hearthtalk_core::message::{ContentPart, Message, MessageRole};
use hearthtalk_core::options::{AgentOptions, TruncateStrategy};
use hearthtalk_core::template::TemplateError;
use hearthtalk_functions::{default_descriptors, ExecutorRegistry, FunctionContext, FunctionDescriptor};
use hearthtalk_llm::{ChatClient, ChatRequest, ToolSpec};

/// Event source tag used when publishing.
const EVENT_SOURCE: &str = "conversation-agent";

/// One utterance from the host.
#[derive(Debug, Clone)]
pub struct ConversationInput {
    /// The utterance text.
    pub text: String,
    /// Conversation to continue, if known.
    pub conversation_id: Option<String>,
    /// Device the utterance came from.
    pub device_id: Option<String>,
    /// Utterance language tag (unused by the agent; the model handles
    /// language).
    pub language: Option<String>,
}

impl ConversationInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conversation_id: None,
            device_id: None,
            language: None,
        }
    }

    /// Continue an existing conversation.
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Tag the invoking device.
    pub fn with_device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }
}

/// What the agent answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse {
    /// Assistant speech.
    Speech { text: String },
    /// A spoken error answer.
    Error { message: String },
}

impl AgentResponse {
    /// The spoken text, whichever kind this is.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Speech { text } => text,
            Self::Error { message } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Result of one conversation turn.
#[derive(Debug, Clone)]
pub struct ConversationResult {
    /// Conversation id to pass back on the next turn.
    pub conversation_id: String,
    pub response: AgentResponse,
}

impl ConversationResult {
    fn speech(conversation_id: String, text: String) -> Self {
        Self {
            conversation_id,
            response: AgentResponse::Speech { text },
        }
    }

    fn error(conversation_id: String, message: String) -> Self {
        Self {
            conversation_id,
            response: AgentResponse::Error { message },
        }
    }
}

/// Conversation agent delegating to the remote chat API.
pub struct ConversationAgent {
    entities: Arc<dyn EntityRegistry>,
    services: Arc<dyn ServiceRegistry>,
    client: ChatClient,
    store: ConversationStore,
    functions: ExecutorRegistry,
    bus: EventBus,
    options: AgentOptions,
    location_name: String,
}

impl std::fmt::Debug for ConversationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationAgent")
            .field("options", &self.options)
            .field("location_name", &self.location_name)
            .finish_non_exhaustive()
    }
}

impl ConversationAgent {
    /// Create an agent with default options, built-in functions, and a
    /// private event bus.
    pub fn new(
        client: ChatClient,
        entities: Arc<dyn EntityRegistry>,
        services: Arc<dyn ServiceRegistry>,
    ) -> Self {
        Self {
            entities,
            services,
            client,
            store: ConversationStore::new(),
            functions: ExecutorRegistry::with_defaults(),
            bus: EventBus::new(),
            options: AgentOptions::default(),
            location_name: "Home".to_string(),
        }
    }

    /// Replace the agent options.
    pub fn with_options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the function executor registry.
    pub fn with_functions(mut self, functions: ExecutorRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Publish events on a shared bus instead of a private one.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Set the hub display name exposed to the prompt template.
    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = name.into();
        self
    }

    /// Current options.
    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// The underlying chat client (used by the image query service).
    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Subscribe to agent events.
    pub fn subscribe(&self) -> EventBusReceiver {
        self.bus.subscribe()
    }

    /// Stored history for a conversation, if any.
    pub fn history(&self, conversation_id: &str) -> Option<Vec<Message>> {
        self.store.history(conversation_id)
    }

    /// Languages the agent supports. The agent itself is language-agnostic;
    /// the remote model handles language.
    pub fn supported_languages(&self) -> &'static str {
        "*"
    }

    /// Process one utterance.
    ///
    /// Known conversation ids continue their stored history; anything else
    /// mints a fresh id seeded with the rendered system prompt. Failed
    /// turns leave the store untouched, so retrying an utterance with the
    /// same id cannot duplicate its human message.
    pub async fn process(&self, input: ConversationInput) -> ConversationResult {
        let exposed = self.entities.exposed_entities();

        let conversation_id = match input.conversation_id.as_deref() {
            Some(id) if self.store.contains(id) => id.to_string(),
            _ => ConversationId::new().into_string(),
        };
        let guard = self.store.turn_guard(&conversation_id);
        let _turn = guard.lock().await;

        let mut messages = match self.store.history(&conversation_id) {
            Some(history) => history,
            None => match self.system_message(&exposed, input.device_id.as_deref()) {
                Ok(message) => vec![message],
                Err(err) => {
                    error!(error = %err, "failed to render the prompt template");
                    return ConversationResult::error(
                        conversation_id,
                        format!("Sorry, I had a problem with my template: {err}"),
                    );
                }
            },
        };
        messages.push(Message::user(input.text.as_str()));

        if estimate_tokens(&messages) > self.options.context_threshold {
            info!(
                conversation_id = %conversation_id,
                threshold = self.options.context_threshold,
                "context threshold exceeded, truncating history"
            );
            messages = truncate(messages, self.options.context_truncate_strategy);
        }

        let tools = self.tool_specs();
        let mut rounds_left = self.options.max_function_calls_per_conversation;

        let response = loop {
            let mut request = ChatRequest::new(
                self.options.model.clone(),
                messages.clone(),
                self.options.max_tokens,
            )
            .with_sampling(self.options.temperature, self.options.top_p);
            if let Some(tools) = tools.clone() {
                request = request.with_tools(tools);
            }

            let response = match self.client.complete(request).await {
                Ok(response) => response,
                Err(err) => {
                    error!(conversation_id = %conversation_id, error = %err, "remote completion failed");
                    return ConversationResult::error(
                        conversation_id,
                        format!("Sorry, I had a problem talking to the language model: {err}"),
                    );
                }
            };

            let tool_uses = response.tool_uses();
            if tool_uses.is_empty() {
                break response;
            }
            if rounds_left == 0 {
                error!(conversation_id = %conversation_id, "function-call budget exhausted");
                return ConversationResult::error(
                    conversation_id,
                    "Sorry, I exceeded the maximum number of function calls for this conversation."
                        .to_string(),
                );
            }
            rounds_left -= 1;

            let ctx = FunctionContext::new(
                self.entities.as_ref(),
                self.services.as_ref(),
                &exposed,
            );
            let mut result_parts = Vec::with_capacity(tool_uses.len());
            for tool_use in &tool_uses {
                debug!(
                    conversation_id = %conversation_id,
                    function = %tool_use.name,
                    "dispatching function call"
                );
                match self
                    .functions
                    .execute(tool_use.name, tool_use.input.clone(), &ctx)
                    .await
                {
                    Ok(result) => {
                        result_parts.push(ContentPart::tool_result(tool_use.id, result.to_string()));
                    }
                    Err(err) => {
                        error!(
                            conversation_id = %conversation_id,
                            function = %tool_use.name,
                            error = %err,
                            "function dispatch failed"
                        );
                        return ConversationResult::error(
                            conversation_id,
                            format!("Something went wrong: {err}"),
                        );
                    }
                }
            }
            messages.push(Message::from_parts(
                MessageRole::Assistant,
                response.content.clone(),
            ));
            messages.push(Message::from_parts(MessageRole::User, result_parts));
        };

        let speech = response.text();
        messages.push(Message::from_parts(
            MessageRole::Assistant,
            response.content.clone(),
        ));
        self.store.save(&conversation_id, messages.clone());

        self.bus.publish(
            AgentEvent::ConversationFinished {
                conversation_id: conversation_id.clone(),
                text: input.text,
                response: response.to_value(),
                messages,
            },
            EVENT_SOURCE,
        );

        ConversationResult::speech(conversation_id, speech)
    }

    fn system_message(
        &self,
        exposed: &[ExposedEntity],
        device_id: Option<&str>,
    ) -> Result<Message, TemplateError> {
        let prompt = crate::prompt::render_system_prompt(
            &self.options.prompt,
            &crate::prompt::PromptContext {
                location_name: &self.location_name,
                device_id,
                entities: exposed,
            },
        )?;
        Ok(Message::system(prompt))
    }

    /// Descriptors advertised to the model this turn.
    ///
    /// `options.functions = None` uses the built-in set; an empty list
    /// disables function calling entirely.
    fn tool_specs(&self) -> Option<Vec<ToolSpec>> {
        let descriptors: Vec<FunctionDescriptor> = match &self.options.functions {
            None => default_descriptors(),
            Some(raw) => raw
                .iter()
                .filter_map(|value| {
                    match serde_json::from_value::<FunctionDescriptor>(value.clone()) {
                        Ok(descriptor) => Some(descriptor),
                        Err(err) => {
                            warn!(error = %err, "skipping malformed function descriptor");
                            None
                        }
                    }
                })
                .collect(),
        };
        if descriptors.is_empty() {
            return None;
        }
        Some(
            descriptors
                .into_iter()
                .map(|descriptor| ToolSpec {
                    name: descriptor.name,
                    description: descriptor.description,
                    input_schema: descriptor.parameters,
                })
                .collect(),
        )
    }
}

/// Rough token estimate for threshold checks (~4 chars per token).
fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.text().len()).sum::<usize>() / 4
}

/// Apply the configured truncation strategy.
///
/// `Clear` keeps only the conversation's system seed and the current human
/// message.
fn truncate(messages: Vec<Message>, strategy: TruncateStrategy) -> Vec<Message> {
    match strategy {
        TruncateStrategy::Clear => {
            let mut kept = Vec::with_capacity(2);
            if let Some(first) = messages.first() {
                if first.role == MessageRole::System {
                    kept.push(first.clone());
                }
            }
            if let Some(last) = messages.last() {
                kept.push(last.clone());
            }
            kept
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        let messages = vec![Message::user("a".repeat(400))];
        assert_eq!(estimate_tokens(&messages), 100);
    }

    #[test]
    fn test_truncate_clear_keeps_seed_and_current_turn() {
        let messages = vec![
            Message::system("seed"),
            Message::user("old question"),
            Message::assistant("old answer"),
            Message::user("current question"),
        ];
        let kept = truncate(messages, TruncateStrategy::Clear);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].role, MessageRole::System);
        assert_eq!(kept[1].text(), "current question");
    }
}
