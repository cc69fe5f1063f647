//! Remote chat client for HearthTalk.
//!
//! Wraps the hosted messages API in a typed client with a small error
//! taxonomy (auth / status / timeout / connection), plus the credential
//! validation probe used at setup and configuration time.

pub mod client;
pub mod error;

pub use client::{
    ChatClient, ChatClientConfig, ChatRequest, ChatResponse, ModelInfo, ToolSpec, ToolUseRef,
    Usage, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
pub use error::{ChatError, CredentialError};
