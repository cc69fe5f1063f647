//! System prompt construction.
//!
//! The system message is rendered once at conversation start from the
//! configured template and the turn's live context. Exposed entities are
//! pre-rendered into a CSV block so templates can drop them in with a
//! single `{{exposed_entities}}` placeholder.

use std::collections::HashMap;

use hearthtalk_core::entity::ExposedEntity;
use hearthtalk_core::template::{PromptTemplate, TemplateError};

/// Turn context available to the prompt template.
pub struct PromptContext<'a> {
    /// Hub display name (`{{location_name}}`).
    pub location_name: &'a str,
    /// Device the utterance came from (`{{device_id}}`).
    pub device_id: Option<&'a str>,
    /// This turn's exposed-entity snapshot (`{{exposed_entities}}`).
    pub entities: &'a [ExposedEntity],
}

/// Render the system prompt template against the turn context.
pub fn render_system_prompt(
    template: &str,
    ctx: &PromptContext<'_>,
) -> Result<String, TemplateError> {
    let mut vars = HashMap::new();
    vars.insert("location_name".to_string(), ctx.location_name.to_string());
    vars.insert(
        "current_time".to_string(),
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    vars.insert(
        "device_id".to_string(),
        ctx.device_id.unwrap_or("unknown").to_string(),
    );
    vars.insert("exposed_entities".to_string(), entity_csv(ctx.entities));
    PromptTemplate::new(template).render(&vars)
}

/// Render entities as CSV rows: `entity_id,name,state,aliases`.
///
/// Aliases are joined with `/` so the row stays a single CSV field.
pub fn entity_csv(entities: &[ExposedEntity]) -> String {
    entities
        .iter()
        .map(|entity| {
            format!(
                "{},{},{},{}",
                entity.entity_id,
                entity.name,
                entity.state,
                entity.aliases.join("/")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
