//! Remote chat-completion client.
//!
//! A thin shim over the hosted messages API: one request per call, no
//! retries, no backoff. All wire types except [`ChatResponse`] are private
//! to this module; callers work with core [`Message`]s.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use hearthtalk_core::message::{Content, ContentPart, Message, MessageRole};

use crate::error::{ChatError, CredentialError};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// API version header value sent with every request.
const API_VERSION: &str = "2023-06-01";

/// Chat client configuration.
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// API credential.
    pub api_key: String,
    /// API base URL (default: the hosted endpoint).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ChatClientConfig {
    /// Create a config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL. A trailing slash is stripped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Ordered message history, system messages included.
    pub messages: Vec<Message>,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Sampling temperature. `None` uses the API default.
    pub temperature: Option<f32>,
    /// Nucleus-sampling top-p. `None` uses the API default.
    pub top_p: Option<f32>,
    /// Function descriptors advertised to the model.
    pub tools: Option<Vec<ToolSpec>>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature: None,
            top_p: None,
            tools: None,
        }
    }

    /// Set sampling parameters.
    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = Some(temperature);
        self.top_p = Some(top_p);
        self
    }

    /// Advertise function descriptors to the model.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// A function advertised to the model, in wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completion response.
///
/// Content blocks reuse the core [`ContentPart`] type, so tool-use blocks
/// decode directly and the blocks can be appended to history as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    #[serde(default = "assistant_role")]
    pub role: String,
    pub content: Vec<ContentPart>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

fn assistant_role() -> String {
    "assistant".to_string()
}

/// A tool-use block borrowed from a response.
#[derive(Debug, Clone, Copy)]
pub struct ToolUseRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub input: &'a Value,
}

impl ChatResponse {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All tool-use blocks in the response, in order.
    pub fn tool_uses(&self) -> Vec<ToolUseRef<'_>> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolUse { id, name, input } => Some(ToolUseRef {
                    id: id.as_str(),
                    name: name.as_str(),
                    input,
                }),
                _ => None,
            })
            .collect()
    }

    /// Raw response payload, for event emission and service responses.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("response payload serializes")
    }
}

/// A model listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Client for the hosted messages API.
///
/// Cheap to clone; the underlying HTTP client is reference-counted.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl ChatClient {
    /// Build a client from config.
    pub fn new(config: ChatClientConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Send one completion request.
    pub async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let (system, messages) = to_wire(&request.messages);
        let payload = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system,
            messages,
            temperature: request.temperature,
            top_p: request.top_p,
            tools: request.tools.as_deref(),
        };

        debug!(
            model = %request.model,
            messages = payload.messages.len(),
            max_tokens = request.max_tokens,
            "sending completion request"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to decode completion response");
            ChatError::InvalidResponse(e.to_string())
        })?;

        debug!(
            id = %parsed.id,
            stop_reason = ?parsed.stop_reason,
            blocks = parsed.content.len(),
            "received completion response"
        );
        Ok(parsed)
    }

    /// List available models, a minimal authenticated read-only call.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let parsed: ModelList = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        Ok(parsed.data)
    }

    /// Validate the configured credential with the list-models probe.
    ///
    /// Authentication and status failures mean the key is bad; transport
    /// failures (including an undecodable body) mean the API is unreachable
    /// and the caller may retry later.
    pub async fn validate_credentials(&self) -> Result<(), CredentialError> {
        match self.list_models().await {
            Ok(_) => Ok(()),
            Err(err @ (ChatError::Auth(_) | ChatError::Status { .. })) => {
                Err(CredentialError::InvalidAuth(err))
            }
            Err(err) => Err(CredentialError::CannotConnect(err)),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::Timeout(self.timeout_secs)
        } else {
            ChatError::Connection(e.to_string())
        }
    }

    /// Return the response if successful, or map the status to the error
    /// taxonomy (decoding the API error envelope when present).
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read error body>".to_string());
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => body,
        };

        error!(%status, %message, "remote API returned an error");
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            Err(ChatError::Auth(message))
        } else {
            Err(ChatError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

// ── Private wire types ──

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
}

#[derive(Serialize)]
struct WireMessage {
    role: MessageRole,
    content: Value,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelInfo>,
}

// Error envelope: `{"type": "error", "error": {"type": ..., "message": ...}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Lift system messages into the wire-level system field; everything else
/// becomes a wire message in order.
fn to_wire(messages: &[Message]) -> (Option<String>, Vec<WireMessage>) {
    let mut system_parts = Vec::new();
    let mut wire = Vec::new();
    for message in messages {
        match message.role {
            MessageRole::System => system_parts.push(message.text()),
            role => wire.push(WireMessage {
                role,
                content: content_value(&message.content),
            }),
        }
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, wire)
}

fn content_value(content: &Content) -> Value {
    match content {
        Content::Text(text) => Value::String(text.clone()),
        Content::Parts(parts) => {
            serde_json::to_value(parts).expect("content blocks serialize")
        }
    }
}
