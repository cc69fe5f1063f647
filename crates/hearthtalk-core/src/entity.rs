//! Entities the user has exposed to conversation agents.

use serde::{Deserialize, Serialize};

/// A home-automation entity visible to the agent.
///
/// Derived fresh from live hub state on every turn; never cached across
/// turns, so the model always sees current state values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposedEntity {
    /// Entity identifier, e.g. `light.kitchen`.
    pub entity_id: String,
    /// Display name.
    pub name: String,
    /// Current state value, as a string.
    pub state: String,
    /// User-assigned aliases.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ExposedEntity {
    pub fn new(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            state: state.into(),
            aliases: Vec::new(),
        }
    }

    /// Add aliases to the entity.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }
}
