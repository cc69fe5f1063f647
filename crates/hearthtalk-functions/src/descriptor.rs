//! Function descriptors advertised to the model.
//!
//! A descriptor is pure data: name, natural-language description, and a
//! JSON-Schema-style parameter object. New actions are added by data alone;
//! execution is bound separately through the executor registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function the model may invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Function name.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// Parameters as a JSON Schema object.
    pub parameters: Value,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Helper to create a JSON object schema.
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Helper to create a simple typed property.
pub fn property(prop_type: &str, description: &str) -> Value {
    serde_json::json!({
        "type": prop_type,
        "description": description,
    })
}

/// Helper to create a string property.
pub fn string_property(description: &str) -> Value {
    property("string", description)
}

/// Helper to create an array property with object items.
pub fn array_property(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description,
    })
}

/// The built-in descriptor set: the single service-execution function.
pub fn default_descriptors() -> Vec<FunctionDescriptor> {
    vec![FunctionDescriptor::new(
        crate::service_call::EXECUTE_SERVICES,
        "Use this function to execute a service of devices in the home-automation hub.",
        object_schema(
            serde_json::json!({
                "list": array_property(
                    object_schema(
                        serde_json::json!({
                            "domain": string_property("The domain of the service"),
                            "service": string_property("The service to be called"),
                            "service_data": object_schema(
                                serde_json::json!({
                                    "entity_id": string_property(
                                        "The entity_id retrieved from available devices. \
                                         It must start with domain, followed by dot character."
                                    ),
                                }),
                                &["entity_id"],
                            ),
                        }),
                        &["domain", "service", "service_data"],
                    ),
                    "The list of services to execute",
                ),
            }),
            &["list"],
        ),
    )]
}
