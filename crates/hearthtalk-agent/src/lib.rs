//! HearthTalk conversation agent.
//!
//! Orchestrates prompt construction, per-conversation history, the remote
//! completion call, and function dispatch behind the host's
//! conversation-agent contract.

pub mod agent;
pub mod entry;
pub mod image;
pub mod prompt;

pub use agent::{AgentResponse, ConversationAgent, ConversationInput, ConversationResult};
pub use entry::{EntryRegistry, SetupError};
pub use image::{
    query_image, ImageQueryError, ImageQueryRequest, ImageRef, DEFAULT_IMAGE_MAX_TOKENS,
    DEFAULT_IMAGE_MODEL,
};
pub use prompt::{entity_csv, render_system_prompt, PromptContext};
