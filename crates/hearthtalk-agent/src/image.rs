//! Side-channel image query service.
//!
//! Lets automations ask the remote model about a set of images, outside
//! the conversation flow. Returns the raw response payload.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use hearthtalk_core::message::{ContentPart, Message, MessageRole};
use hearthtalk_llm::{ChatError, ChatRequest};

use crate::entry::EntryRegistry;

/// Default model for image queries.
pub const DEFAULT_IMAGE_MODEL: &str = "claude-3-opus-20240229";

/// Default completion budget for image queries.
pub const DEFAULT_IMAGE_MAX_TOKENS: u32 = 1024;

/// An image reference passed to the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// Parameters of one image query.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageQueryRequest {
    /// Config entry whose credential to use.
    pub config_entry: String,
    /// Model identifier.
    #[serde(default = "default_image_model")]
    pub model: String,
    /// Text prompt shown alongside the images.
    pub prompt: String,
    /// Images to analyze.
    pub images: Vec<ImageRef>,
    /// Completion token budget.
    #[serde(default = "default_image_max_tokens")]
    pub max_tokens: u32,
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_image_max_tokens() -> u32 {
    DEFAULT_IMAGE_MAX_TOKENS
}

/// Image query failure.
#[derive(Debug, thiserror::Error)]
pub enum ImageQueryError {
    #[error("unknown config entry: {0}")]
    UnknownEntry(String),

    #[error("error querying image: {0}")]
    Query(#[from] ChatError),
}

/// Run an image query against the entry's configured client.
pub async fn query_image(
    registry: &EntryRegistry,
    request: ImageQueryRequest,
) -> Result<Value, ImageQueryError> {
    let agent = registry
        .agent(&request.config_entry)
        .ok_or_else(|| ImageQueryError::UnknownEntry(request.config_entry.clone()))?;

    let mut parts = Vec::with_capacity(request.images.len() + 1);
    parts.push(ContentPart::text(request.prompt.as_str()));
    parts.extend(
        request
            .images
            .iter()
            .map(|image| ContentPart::image_url(image.url.as_str())),
    );
    let message = Message::from_parts(MessageRole::User, parts);

    info!(
        model = %request.model,
        images = request.images.len(),
        "querying images"
    );
    let response = agent
        .client()
        .complete(ChatRequest::new(
            request.model,
            vec![message],
            request.max_tokens,
        ))
        .await?;
    Ok(response.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: ImageQueryRequest = serde_json::from_value(serde_json::json!({
            "config_entry": "entry-1",
            "prompt": "What is in these photos?",
            "images": [{"url": "https://example.com/a.jpg"}]
        }))
        .unwrap();
        assert_eq!(request.model, DEFAULT_IMAGE_MODEL);
        assert_eq!(request.max_tokens, DEFAULT_IMAGE_MAX_TOKENS);
        assert_eq!(request.images.len(), 1);
    }
}
