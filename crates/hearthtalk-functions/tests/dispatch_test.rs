//! Dispatch tests against in-memory hub fakes.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use hearthtalk_core::entity::ExposedEntity;
use hearthtalk_core::hub::{EntityRegistry, HubError, ServiceRegistry};
use hearthtalk_functions::{
    ExecutorRegistry, FunctionContext, FunctionError, EXECUTE_SERVICES,
};

/// Entity registry fake: `existing` is hub state, `exposed` the opt-in set.
struct FakeEntities {
    existing: Vec<String>,
}

impl EntityRegistry for FakeEntities {
    fn exposed_entities(&self) -> Vec<ExposedEntity> {
        Vec::new()
    }

    fn entity_exists(&self, entity_id: &str) -> bool {
        self.existing.iter().any(|id| id == entity_id)
    }
}

/// Service registry fake recording calls; entities listed in `fail_for`
/// make the host call fail.
struct FakeServices {
    registered: Vec<(String, String)>,
    fail_for: Vec<String>,
    calls: Mutex<Vec<(String, String, Value)>>,
}

impl FakeServices {
    fn new(registered: &[(&str, &str)]) -> Self {
        Self {
            registered: registered
                .iter()
                .map(|(d, s)| (d.to_string(), s.to_string()))
                .collect(),
            fail_for: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_for(mut self, entity_id: &str) -> Self {
        self.fail_for.push(entity_id.to_string());
        self
    }

    fn calls(&self) -> Vec<(String, String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceRegistry for FakeServices {
    fn has_service(&self, domain: &str, service: &str) -> bool {
        self.registered
            .iter()
            .any(|(d, s)| d == domain && s == service)
    }

    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: Value,
    ) -> Result<(), HubError> {
        self.calls
            .lock()
            .unwrap()
            .push((domain.to_string(), service.to_string(), data.clone()));

        let targets = data["entity_id"].as_array().cloned().unwrap_or_default();
        for target in targets {
            if let Some(id) = target.as_str() {
                if self.fail_for.iter().any(|f| f == id) {
                    return Err(HubError::new(format!("device {id} is unavailable")));
                }
            }
        }
        Ok(())
    }
}

fn exposed(ids: &[&str]) -> Vec<ExposedEntity> {
    ids.iter()
        .map(|id| ExposedEntity::new(*id, *id, "off"))
        .collect()
}

fn service_args(entity_id: &str) -> Value {
    json!({
        "list": [{
            "domain": "light",
            "service": "turn_on",
            "service_data": {"entity_id": entity_id}
        }]
    })
}

#[tokio::test]
async fn test_execute_service_success() {
    let entities = FakeEntities {
        existing: vec!["light.kitchen".to_string()],
    };
    let services = FakeServices::new(&[("light", "turn_on")]);
    let snapshot = exposed(&["light.kitchen"]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let result = registry
        .execute(EXECUTE_SERVICES, service_args("light.kitchen"), &ctx)
        .await
        .unwrap();

    assert_eq!(result, json!([{"success": true}]));
    let calls = services.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "light");
    assert_eq!(calls[0].1, "turn_on");
    assert_eq!(calls[0].2["entity_id"], json!(["light.kitchen"]));
}

#[tokio::test]
async fn test_unexposed_entity_is_rejected_before_the_call() {
    let entities = FakeEntities {
        existing: vec!["light.kitchen".to_string()],
    };
    let services = FakeServices::new(&[("light", "turn_on")]);
    // Exists in hub state but missing from the exposed snapshot.
    let snapshot = exposed(&["light.hall"]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let err = registry
        .execute(EXECUTE_SERVICES, service_args("light.kitchen"), &ctx)
        .await
        .unwrap_err();

    assert!(
        matches!(err, FunctionError::EntityNotExposed { ref ids } if ids == &["light.kitchen"]),
        "got {err:?}"
    );
    assert!(services.calls().is_empty(), "service must not be invoked");
}

#[tokio::test]
async fn test_unknown_entity_fails_before_exposure_check() {
    let entities = FakeEntities { existing: vec![] };
    let services = FakeServices::new(&[("light", "turn_on")]);
    // Not exposed either; existence must win.
    let snapshot = exposed(&[]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let err = registry
        .execute(EXECUTE_SERVICES, service_args("light.basement"), &ctx)
        .await
        .unwrap_err();

    assert!(
        matches!(err, FunctionError::EntityNotFound { ref ids } if ids == &["light.basement"]),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let entities = FakeEntities {
        existing: vec!["light.kitchen".to_string()],
    };
    let services = FakeServices::new(&[]);
    let snapshot = exposed(&["light.kitchen"]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let err = registry
        .execute(EXECUTE_SERVICES, service_args("light.kitchen"), &ctx)
        .await
        .unwrap_err();

    match err {
        FunctionError::NotFound(message) => {
            assert!(message.contains("light.turn_on"), "got: {message}")
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_entity_id_is_call_service_error() {
    let entities = FakeEntities {
        existing: vec!["light.kitchen".to_string()],
    };
    let services = FakeServices::new(&[("light", "turn_on")]);
    let snapshot = exposed(&["light.kitchen"]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let err = registry
        .execute(
            EXECUTE_SERVICES,
            json!({"list": [{"domain": "light", "service": "turn_on", "service_data": {}}]}),
            &ctx,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FunctionError::CallService { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_schema_mismatch_names_the_function() {
    let entities = FakeEntities { existing: vec![] };
    let services = FakeServices::new(&[]);
    let snapshot = exposed(&[]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let err = registry
        .execute(EXECUTE_SERVICES, json!({"list": "not-an-array"}), &ctx)
        .await
        .unwrap_err();

    match err {
        FunctionError::InvalidArguments { function, .. } => {
            assert_eq!(function, EXECUTE_SERVICES)
        }
        other => panic!("expected InvalidArguments, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_failure_does_not_abort_siblings() {
    let entities = FakeEntities {
        existing: vec![
            "light.kitchen".to_string(),
            "light.hall".to_string(),
            "light.porch".to_string(),
        ],
    };
    let services = FakeServices::new(&[("light", "turn_on")]).failing_for("light.hall");
    let snapshot = exposed(&["light.kitchen", "light.hall", "light.porch"]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let args = json!({
        "list": [
            {"domain": "light", "service": "turn_on", "service_data": {"entity_id": "light.kitchen"}},
            {"domain": "light", "service": "turn_on", "service_data": {"entity_id": "light.hall"}},
            {"domain": "light", "service": "turn_on", "service_data": {"entity_id": "light.porch"}},
        ]
    });

    let registry = ExecutorRegistry::with_defaults();
    let result = registry
        .execute(EXECUTE_SERVICES, args, &ctx)
        .await
        .unwrap();

    let results = result.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], json!({"success": true}));
    assert!(results[1]["error"]
        .as_str()
        .unwrap()
        .contains("light.hall is unavailable"));
    assert_eq!(results[2], json!({"success": true}));
    assert_eq!(services.calls().len(), 3);
}

#[tokio::test]
async fn test_comma_separated_targets_fan_out_in_one_call() {
    let entities = FakeEntities {
        existing: vec!["light.kitchen".to_string(), "light.hall".to_string()],
    };
    let services = FakeServices::new(&[("light", "turn_on")]);
    let snapshot = exposed(&["light.kitchen", "light.hall"]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    let result = registry
        .execute(
            EXECUTE_SERVICES,
            service_args("light.kitchen, light.hall"),
            &ctx,
        )
        .await
        .unwrap();

    assert_eq!(result, json!([{"success": true}]));
    let calls = services.calls();
    assert_eq!(calls[0].2["entity_id"], json!(["light.kitchen", "light.hall"]));
}

#[tokio::test]
async fn test_unknown_function_name_at_registry_level() {
    let entities = FakeEntities { existing: vec![] };
    let services = FakeServices::new(&[]);
    let snapshot = exposed(&[]);
    let ctx = FunctionContext::new(&entities, &services, &snapshot);

    let registry = ExecutorRegistry::with_defaults();
    assert!(registry.has(EXECUTE_SERVICES));

    let err = registry
        .execute("open_the_pod_bay_doors", json!({}), &ctx)
        .await
        .unwrap_err();
    assert!(
        matches!(err, FunctionError::NotFound(ref name) if name == "open_the_pod_bay_doors"),
        "got {err:?}"
    );
}
