//! delete_task: remove a task permanently.

use crate::params::{self, USER_ID};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::schema::ParameterSchema;
use taskrelay_core::store::TaskStore;
use tracing::debug;

pub struct DeleteTaskCapability {
    store: Arc<dyn TaskStore>,
}

impl DeleteTaskCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for DeleteTaskCapability {
    fn name(&self) -> &str {
        "delete_task"
    }

    fn description(&self) -> &str {
        "Delete one of the user's tasks"
    }

    fn parameter_schema(&self) -> Option<ParameterSchema> {
        Some(
            ParameterSchema::new()
                .field(USER_ID, params::user_id_field())
                .field("task_id", params::task_id_field()),
        )
    }

    async fn execute(&self, parameters: Parameters) -> HandlerResult {
        let user_id = params::required_str(&parameters, USER_ID)?;
        let task_id = params::required_str(&parameters, "task_id")?;

        self.store.delete(user_id, task_id).await?;
        debug!(task_id, user_id, "Task deleted");

        Ok(json!({
            "task_id": task_id,
            "message": "Task deleted successfully",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrelay_core::error::CapabilityError;
    use taskrelay_core::store::NewTask;
    use taskrelay_store::InMemoryTaskStore;

    #[tokio::test]
    async fn deletes_and_then_reports_not_found() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = store.create("alice", NewTask::titled("gone")).await.unwrap();
        let capability = DeleteTaskCapability::new(store);
        let args = json!({"user_id": "alice", "task_id": task.id}).as_object().cloned().unwrap();

        let result = capability.execute(args.clone()).await.unwrap();
        assert_eq!(result["message"], "Task deleted successfully");

        let err = capability.execute(args).await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));
    }
}
