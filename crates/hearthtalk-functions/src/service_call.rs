//! The built-in service-execution function family.
//!
//! `execute_services` takes a list of `{domain, service, service_data}`
//! entries, authorizes every targeted entity against the turn's exposed
//! set, and invokes the hub service once per entry. Entries are attempted
//! independently; a failed host call records an error for that entry only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::error::{FunctionError, Result};
use crate::executor::{FunctionContext, FunctionExecutor};

/// Name of the built-in service-execution function.
pub const EXECUTE_SERVICES: &str = "execute_services";

/// One or more entity IDs, as the model may send either form.
///
/// A single string may itself be a comma-separated list; [`normalize`]
/// always yields a flat list of trimmed IDs.
///
/// [`normalize`]: EntityIds::normalize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityIds {
    One(String),
    Many(Vec<String>),
}

impl EntityIds {
    /// Normalize to a flat list of trimmed entity IDs.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            Self::One(s) => s
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            Self::Many(ids) => ids.iter().map(|id| id.trim().to_string()).collect(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// A parsed service-invocation request: domain, service, and a data
/// payload carrying the resolved entity-id list.
#[derive(Debug, Clone)]
pub struct ServiceInvocation {
    pub domain: String,
    pub service: String,
    pub data: Map<String, Value>,
    pub entity_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceCallArgs {
    list: Vec<ServiceCallEntry>,
}

#[derive(Debug, Deserialize)]
struct ServiceCallEntry {
    domain: String,
    service: String,
    /// Preferred data payload key.
    #[serde(default)]
    service_data: Option<Map<String, Value>>,
    /// Accepted alias for `service_data`.
    #[serde(default)]
    data: Option<Map<String, Value>>,
    /// Entity id given at the entry level instead of inside the payload.
    #[serde(default)]
    entity_id: Option<EntityIds>,
}

impl ServiceCallEntry {
    /// Resolve into a [`ServiceInvocation`], or fail when no entity id can
    /// be found anywhere in the entry.
    fn resolve(self) -> Result<ServiceInvocation> {
        let mut data = self.service_data.or(self.data).unwrap_or_default();

        let ids = data
            .get("entity_id")
            .and_then(EntityIds::from_value)
            .or(self.entity_id);

        let Some(ids) = ids else {
            return Err(FunctionError::CallService {
                domain: self.domain,
                service: self.service,
                data: Value::Object(data),
            });
        };

        let entity_ids = ids.normalize();
        data.insert("entity_id".to_string(), serde_json::json!(entity_ids));
        Ok(ServiceInvocation {
            domain: self.domain,
            service: self.service,
            data,
            entity_ids,
        })
    }
}

/// Executor for [`EXECUTE_SERVICES`].
pub struct ServiceCallExecutor;

#[async_trait]
impl FunctionExecutor for ServiceCallExecutor {
    fn name(&self) -> &str {
        EXECUTE_SERVICES
    }

    async fn execute(&self, args: Value, ctx: &FunctionContext<'_>) -> Result<Value> {
        let args: ServiceCallArgs =
            serde_json::from_value(args).map_err(|e| FunctionError::InvalidArguments {
                function: EXECUTE_SERVICES.to_string(),
                reason: e.to_string(),
            })?;

        let mut results = Vec::with_capacity(args.list.len());
        for entry in args.list {
            results.push(self.execute_single(entry, ctx).await?);
        }
        Ok(Value::Array(results))
    }
}

impl ServiceCallExecutor {
    /// Validate and invoke one entry.
    ///
    /// Validation failures (missing entity id, unknown service, unknown or
    /// unexposed entity) propagate and fail the whole call; a failure of
    /// the host invocation itself is recorded as this entry's result so
    /// sibling entries still run.
    async fn execute_single(
        &self,
        entry: ServiceCallEntry,
        ctx: &FunctionContext<'_>,
    ) -> Result<Value> {
        let invocation = entry.resolve()?;

        if !ctx
            .services
            .has_service(&invocation.domain, &invocation.service)
        {
            return Err(FunctionError::NotFound(format!(
                "service {}.{} not found",
                invocation.domain, invocation.service
            )));
        }
        ctx.validate_entity_ids(&invocation.entity_ids)?;

        match ctx
            .services
            .call_service(
                &invocation.domain,
                &invocation.service,
                Value::Object(invocation.data),
            )
            .await
        {
            Ok(()) => Ok(serde_json::json!({"success": true})),
            Err(e) => {
                error!(
                    domain = %invocation.domain,
                    service = %invocation.service,
                    error = %e,
                    "service call failed"
                );
                Ok(serde_json::json!({"error": e.to_string()}))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_single_id() {
        let ids = EntityIds::One("light.kitchen".to_string());
        assert_eq!(ids.normalize(), vec!["light.kitchen"]);
    }

    #[test]
    fn test_normalize_comma_separated() {
        let ids = EntityIds::One("light.kitchen, light.hall".to_string());
        assert_eq!(ids.normalize(), vec!["light.kitchen", "light.hall"]);
    }

    #[test]
    fn test_normalize_list_equals_comma_form() {
        let joined = EntityIds::One("light.kitchen,light.hall".to_string());
        let listed = EntityIds::Many(vec![
            "light.kitchen".to_string(),
            "light.hall".to_string(),
        ]);
        assert_eq!(joined.normalize(), listed.normalize());
    }

    #[test]
    fn test_resolve_prefers_service_data_entity_id() {
        let entry: ServiceCallEntry = serde_json::from_value(serde_json::json!({
            "domain": "light",
            "service": "turn_on",
            "service_data": {"entity_id": "light.kitchen", "brightness": 255}
        }))
        .unwrap();
        let invocation = entry.resolve().unwrap();
        assert_eq!(invocation.entity_ids, vec!["light.kitchen"]);
        assert_eq!(invocation.data["brightness"], 255);
        assert_eq!(invocation.data["entity_id"], serde_json::json!(["light.kitchen"]));
    }

    #[test]
    fn test_resolve_accepts_data_alias_and_entry_level_id() {
        let entry: ServiceCallEntry = serde_json::from_value(serde_json::json!({
            "domain": "switch",
            "service": "toggle",
            "data": {},
            "entity_id": "switch.fan"
        }))
        .unwrap();
        let invocation = entry.resolve().unwrap();
        assert_eq!(invocation.entity_ids, vec!["switch.fan"]);
    }

    #[test]
    fn test_resolve_without_entity_id_fails() {
        let entry: ServiceCallEntry = serde_json::from_value(serde_json::json!({
            "domain": "light",
            "service": "turn_on",
            "service_data": {"brightness": 255}
        }))
        .unwrap();
        let err = entry.resolve().unwrap_err();
        match err {
            FunctionError::CallService { domain, service, .. } => {
                assert_eq!(domain, "light");
                assert_eq!(service, "turn_on");
            }
            other => panic!("expected CallService, got {other:?}"),
        }
    }
}
