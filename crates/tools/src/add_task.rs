//! add_task: create a task for the caller.

use crate::params::{self, USER_ID};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::schema::ParameterSchema;
use taskrelay_core::store::TaskStore;
use tracing::debug;

pub struct AddTaskCapability {
    store: Arc<dyn TaskStore>,
}

impl AddTaskCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for AddTaskCapability {
    fn name(&self) -> &str {
        "add_task"
    }

    fn description(&self) -> &str {
        "Create a new task for the user"
    }

    fn parameter_schema(&self) -> Option<ParameterSchema> {
        Some(
            ParameterSchema::new()
                .field(USER_ID, params::user_id_field())
                .field("title", params::title_field(true))
                .field("description", params::description_field())
                .field("tags", params::tags_field())
                .field("category", params::category_field()),
        )
    }

    async fn execute(&self, parameters: Parameters) -> HandlerResult {
        let user_id = params::required_str(&parameters, USER_ID)?;
        let new_task = params::new_task_from(&parameters)?;

        let task = self.store.create(user_id, new_task).await?;
        debug!(task_id = %task.id, user_id, "Task created");

        Ok(json!({
            "task_id": task.id,
            "title": task.title,
            "message": "Task created successfully",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrelay_core::error::CapabilityError;
    use taskrelay_core::store::TaskFilter;
    use taskrelay_store::InMemoryTaskStore;

    fn args(value: serde_json::Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn creates_task_for_user() {
        let store = Arc::new(InMemoryTaskStore::new());
        let capability = AddTaskCapability::new(store.clone());

        let result = capability
            .execute(args(json!({"user_id": "alice", "title": "Buy milk", "tags": ["home"]})))
            .await
            .unwrap();
        assert_eq!(result["title"], "Buy milk");
        assert_eq!(result["message"], "Task created successfully");

        let tasks = store.list("alice", &TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, result["task_id"]);
        assert_eq!(tasks[0].tags, vec!["home"]);
    }

    #[tokio::test]
    async fn overlong_title_is_validation_error() {
        let capability = AddTaskCapability::new(Arc::new(InMemoryTaskStore::new()));
        let err = capability
            .execute(args(json!({"user_id": "alice", "title": "x".repeat(256)})))
            .await
            .unwrap_err();
        match err {
            CapabilityError::InvalidParameters { details, .. } => {
                assert!(details["title"].contains("1-255"));
            }
            other => panic!("Expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn schema_requires_user_and_title() {
        let capability = AddTaskCapability::new(Arc::new(InMemoryTaskStore::new()));
        let schema = capability.parameter_schema().unwrap();
        assert_eq!(schema.required_fields(), vec!["user_id", "title"]);
    }
}
