//! Prompt template rendering.
//!
//! The system prompt is a user-configurable template with `{{variable}}`
//! placeholders, rendered once per conversation against turn context
//! (location name, current time, device id, exposed entities).
//!
//! Rendering is strict: an unclosed placeholder or a placeholder with no
//! bound variable is an error. The agent converts that error into a spoken
//! answer instead of seeding the conversation.

use std::collections::HashMap;

/// Template rendering failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TemplateError {
    /// A `{{` without a matching `}}`.
    #[error("unclosed placeholder starting at offset {0}")]
    Unclosed(usize),

    /// A placeholder naming a variable that was not provided.
    #[error("unknown template variable: {0}")]
    UnknownVariable(String),

    /// A placeholder with an empty or non-identifier name.
    #[error("invalid placeholder: {{{{{0}}}}}")]
    InvalidPlaceholder(String),
}

/// A `{{variable}}` substitution template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Render the template against the given variables.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or(TemplateError::Unclosed(offset + start))?;

            let raw = &after_open[..end];
            let key = raw.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TemplateError::InvalidPlaceholder(raw.to_string()));
            }
            let value = vars
                .get(key)
                .ok_or_else(|| TemplateError::UnknownVariable(key.to_string()))?;
            out.push_str(value);

            rest = &after_open[end + 2..];
            offset += start + 2 + end + 2;
        }
        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_variables() {
        let template = PromptTemplate::new("Hello {{name}}, it is {{time}}.");
        let result = template
            .render(&vars(&[("name", "Home"), ("time", "noon")]))
            .unwrap();
        assert_eq!(result, "Hello Home, it is noon.");
    }

    #[test]
    fn test_render_trims_placeholder_whitespace() {
        let template = PromptTemplate::new("{{ name }}");
        let result = template.render(&vars(&[("name", "Home")])).unwrap();
        assert_eq!(result, "Home");
    }

    #[test]
    fn test_render_without_placeholders_is_identity() {
        let template = PromptTemplate::new("no variables here");
        let result = template.render(&HashMap::new()).unwrap();
        assert_eq!(result, "no variables here");
    }

    #[test]
    fn test_unknown_variable_errors() {
        let template = PromptTemplate::new("{{missing}}");
        let err = template.render(&HashMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownVariable(ref v) if v == "missing"));
    }

    #[test]
    fn test_unclosed_placeholder_errors() {
        let template = PromptTemplate::new("Hello {{name");
        let err = template.render(&vars(&[("name", "Home")])).unwrap_err();
        assert!(matches!(err, TemplateError::Unclosed(6)));
    }

    #[test]
    fn test_invalid_placeholder_errors() {
        let template = PromptTemplate::new("{{now()}}");
        let err = template.render(&HashMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPlaceholder(_)));
    }
}
