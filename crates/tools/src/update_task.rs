//! update_task: partial update of a task's fields.

use crate::params::{self, USER_ID};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::error::CapabilityError;
use taskrelay_core::schema::{FieldKind, FieldSpec, ParameterSchema};
use taskrelay_core::store::TaskStore;

pub struct UpdateTaskCapability {
    store: Arc<dyn TaskStore>,
}

impl UpdateTaskCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for UpdateTaskCapability {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Change the title, description, status, tags or category of a task"
    }

    fn parameter_schema(&self) -> Option<ParameterSchema> {
        Some(
            ParameterSchema::new()
                .field(USER_ID, params::user_id_field())
                .field("task_id", params::task_id_field())
                .field("title", params::title_field(false))
                .field("description", params::description_field())
                .field("completed", FieldSpec::optional(FieldKind::Boolean))
                .field("tags", params::tags_field())
                .field("category", params::category_field()),
        )
    }

    async fn execute(&self, parameters: Parameters) -> HandlerResult {
        let user_id = params::required_str(&parameters, USER_ID)?;
        let task_id = params::required_str(&parameters, "task_id")?;

        let patch = params::patch_from(&parameters)?;
        if patch.is_empty() {
            return Err(CapabilityError::invalid_field(
                "updates",
                "At least one field to update must be provided",
            ));
        }

        let task = self.store.update(user_id, task_id, patch).await?;
        Ok(json!({
            "task_id": task.id,
            "message": "Task updated successfully",
        }))
    }
}
