//! `taskrelay invoke`: Call one capability and print the envelope.

use std::time::Duration;

use taskrelay_agent::CALLER_PARAMETER;
use taskrelay_config::AppConfig;
use taskrelay_core::capability::Parameters;
use taskrelay_core::invocation::InvocationRequest;
use taskrelay_core::registry::CapabilityRegistry;

use super::build_runtime;

/// Parse `--params` and set the caller when the capability declares it.
///
/// `--user` always wins over a `user_id` given in `--params`, so the
/// parameters never name a different caller than the audit record.
fn parameters_for(
    registry: &CapabilityRegistry,
    capability: &str,
    raw: &str,
    user: &str,
) -> Result<Parameters, Box<dyn std::error::Error>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("--params is not valid JSON: {e}"))?;
    let serde_json::Value::Object(mut parameters) = value else {
        return Err("--params must be a JSON object".into());
    };

    let expects_caller = registry
        .lookup(capability)
        .is_some_and(|d| d.expects(CALLER_PARAMETER));
    if expects_caller {
        parameters.insert(CALLER_PARAMETER.into(), user.into());
    }
    Ok(parameters)
}

pub async fn run(
    config: AppConfig,
    capability: String,
    params: String,
    user: String,
    timeout_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime(&config).await?;
    let parameters = parameters_for(runtime.executor.registry(), &capability, &params, &user)?;

    let request = InvocationRequest::new(capability, user).with_parameters(parameters);
    let result = runtime
        .executor
        .execute(request, timeout_ms.map(Duration::from_millis))
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskrelay_core::capability::{CapabilityDescriptor, Handler};
    use taskrelay_core::schema::{FieldKind, FieldSpec, ParameterSchema};

    fn registry() -> CapabilityRegistry {
        let registry = CapabilityRegistry::new();
        registry.register(
            CapabilityDescriptor::new("add_task", Handler::sync(|_| Ok(json!({}))))
                .with_schema(ParameterSchema::new().field("user_id", FieldSpec::required(FieldKind::String))),
        );
        registry
    }

    #[test]
    fn caller_filled_when_declared() {
        let params = parameters_for(&registry(), "add_task", r#"{"title": "x"}"#, "alice").unwrap();
        assert_eq!(params["user_id"], json!("alice"));
    }

    #[test]
    fn caller_overrides_user_id_in_params() {
        let params = parameters_for(&registry(), "add_task", r#"{"user_id": "bob", "title": "x"}"#, "alice").unwrap();
        assert_eq!(params["user_id"], json!("alice"));
        assert_eq!(params["title"], json!("x"));
    }

    #[test]
    fn unknown_capability_left_alone() {
        let params = parameters_for(&registry(), "nope", "{}", "alice").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn non_object_params_rejected() {
        assert!(parameters_for(&registry(), "add_task", "[1, 2]", "alice").is_err());
        assert!(parameters_for(&registry(), "add_task", "{oops", "alice").is_err());
    }
}
