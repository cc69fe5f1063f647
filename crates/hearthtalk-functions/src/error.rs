//! Error types for function dispatch.

use serde_json::Value;

use hearthtalk_core::hub::HubError;

/// Function dispatch failure.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// No function registered under this name, or an unknown service.
    #[error("function not found: {0}")]
    NotFound(String),

    /// Arguments did not match the function's declared schema.
    #[error("invalid arguments for function `{function}`: {reason}")]
    InvalidArguments { function: String, reason: String },

    /// A targeted entity does not exist in hub state.
    #[error("entity not found: {}", .ids.join(", "))]
    EntityNotFound { ids: Vec<String> },

    /// A targeted entity exists but is not exposed to conversation agents.
    #[error("entity not exposed: {}", .ids.join(", "))]
    EntityNotExposed { ids: Vec<String> },

    /// A service call with no resolvable entity-id payload.
    #[error("call-service error: {domain}.{service} with data {data}")]
    CallService {
        domain: String,
        service: String,
        data: Value,
    },

    /// Host hub failure.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Other executor failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for function dispatch.
pub type Result<T> = std::result::Result<T, FunctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_joins_entity_ids() {
        let err = FunctionError::EntityNotExposed {
            ids: vec!["light.kitchen".to_string(), "light.hall".to_string()],
        };
        assert_eq!(err.to_string(), "entity not exposed: light.kitchen, light.hall");
    }
}
