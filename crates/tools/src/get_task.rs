//! get_task: fetch a single task by ID.

use crate::params::{self, USER_ID};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::schema::ParameterSchema;
use taskrelay_core::store::TaskStore;

pub struct GetTaskCapability {
    store: Arc<dyn TaskStore>,
}

impl GetTaskCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for GetTaskCapability {
    fn name(&self) -> &str {
        "get_task"
    }

    fn description(&self) -> &str {
        "Fetch one of the user's tasks"
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

        let task = self.store.get(user_id, task_id).await?;
        Ok(json!({ "task": params::to_value(&task)? }))
    }
}
