//! Agent configuration options and their defaults.
//!
//! Everything here is host-configurable per config entry; the serde
//! defaults let a host supply only the fields it overrides.

use serde::{Deserialize, Serialize};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240620";
/// Default completion token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default nucleus-sampling top-p.
pub const DEFAULT_TOP_P: f32 = 1.0;
/// Default number of function-dispatch rounds allowed per conversation turn.
pub const DEFAULT_MAX_FUNCTION_CALLS: u32 = 1;
/// Default context-length threshold (estimated tokens) before truncation.
pub const DEFAULT_CONTEXT_THRESHOLD: usize = 100_000;

/// Default system prompt template.
pub const DEFAULT_PROMPT: &str = "\
I want you to act as smart home manager of a home-automation hub.
I will provide information of smart home along with a question, you will \
truthfully make correction or answer using information provided in one \
sentence in everyday language.

Current Time: {{current_time}}

Available Devices:
```csv
entity_id,name,state,aliases
{{exposed_entities}}
```

The current state of devices is provided in available devices.
Use the execute_services function only for requested actions, not for current states.
Do not execute services without user's confirmation.
Do not restate or appreciate what the user says, rather make a quick inquiry.
";

/// What to do when a conversation's estimated context exceeds the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncateStrategy {
    /// Drop all messages; the turn restarts from the system prompt.
    #[default]
    Clear,
}

/// Options for one configured agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOptions {
    /// System prompt template (`{{variable}}` placeholders).
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Completion token budget.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, 0–1.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus-sampling top-p, 0–1.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Function-dispatch rounds allowed per conversation turn.
    #[serde(default = "default_max_function_calls")]
    pub max_function_calls_per_conversation: u32,

    /// Function descriptors advertised to the model, as raw descriptor
    /// JSON. `None` uses the built-in set; an empty list disables
    /// function calling.
    #[serde(default)]
    pub functions: Option<Vec<serde_json::Value>>,

    /// Estimated-token threshold above which history is truncated.
    #[serde(default = "default_context_threshold")]
    pub context_threshold: usize,

    /// Truncation strategy applied at the threshold.
    #[serde(default)]
    pub context_truncate_strategy: TruncateStrategy,
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f32 {
    DEFAULT_TOP_P
}

fn default_max_function_calls() -> u32 {
    DEFAULT_MAX_FUNCTION_CALLS
}

fn default_context_threshold() -> usize {
    DEFAULT_CONTEXT_THRESHOLD
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_function_calls_per_conversation: default_max_function_calls(),
            functions: None,
            context_threshold: default_context_threshold(),
            context_truncate_strategy: TruncateStrategy::default(),
        }
    }
}

/// Invalid option value.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionsError {
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
}

impl AgentOptions {
    /// Validate option ranges.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(OptionsError::OutOfRange {
                field: "temperature",
                min: 0.0,
                max: 1.0,
            });
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(OptionsError::OutOfRange {
                field: "top_p",
                min: 0.0,
                max: 1.0,
            });
        }
        if self.max_tokens == 0 {
            return Err(OptionsError::NotPositive {
                field: "max_tokens",
            });
        }
        if self.max_function_calls_per_conversation == 0 {
            return Err(OptionsError::NotPositive {
                field: "max_function_calls_per_conversation",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let options: AgentOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.model, DEFAULT_MODEL);
        assert_eq!(options.max_tokens, 1024);
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.top_p, 1.0);
        assert_eq!(options.context_threshold, 100_000);
        assert_eq!(options.context_truncate_strategy, TruncateStrategy::Clear);
        assert!(options.functions.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut options = AgentOptions::default();
        options.temperature = 1.5;
        assert!(matches!(
            options.validate(),
            Err(OptionsError::OutOfRange { field: "temperature", .. })
        ));

        let mut options = AgentOptions::default();
        options.max_tokens = 0;
        assert!(matches!(
            options.validate(),
            Err(OptionsError::NotPositive { field: "max_tokens" })
        ));
    }

    #[test]
    fn test_truncate_strategy_serde_key() {
        let strategy: TruncateStrategy = serde_json::from_str("\"clear\"").unwrap();
        assert_eq!(strategy, TruncateStrategy::Clear);
    }

    #[test]
    fn test_default_prompt_uses_known_variables() {
        assert!(DEFAULT_PROMPT.contains("{{current_time}}"));
        assert!(DEFAULT_PROMPT.contains("{{exposed_entities}}"));
    }
}
