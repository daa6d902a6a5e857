//! complete_task: mark a task as done.

use crate::params::{self, USER_ID};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::schema::ParameterSchema;
use taskrelay_core::store::{TaskPatch, TaskStore};

pub struct CompleteTaskCapability {
    store: Arc<dyn TaskStore>,
}

impl CompleteTaskCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for CompleteTaskCapability {
    fn name(&self) -> &str {
        "complete_task"
    }

    fn description(&self) -> &str {
        "Mark one of the user's tasks as completed"
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

        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let task = self.store.update(user_id, task_id, patch).await?;

        Ok(json!({
            "task_id": task.id,
            "message": "Task marked as completed",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrelay_core::store::NewTask;
    use taskrelay_store::InMemoryTaskStore;

    #[tokio::test]
    async fn marks_completed() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = store.create("alice", NewTask::titled("Run")).await.unwrap();

        let result = CompleteTaskCapability::new(store.clone())
            .execute(json!({"user_id": "alice", "task_id": task.id}).as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(result["task_id"], task.id.as_str());
        assert!(store.get("alice", &task.id).await.unwrap().completed);
    }
}
