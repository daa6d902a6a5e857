//! list_tasks: the caller's tasks, optionally filtered by completion.

use crate::params::{self, USER_ID};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::schema::{FieldKind, FieldSpec, ParameterSchema};
use taskrelay_core::store::{TaskFilter, TaskStore};

pub struct ListTasksCapability {
    store: Arc<dyn TaskStore>,
}

impl ListTasksCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Capability for ListTasksCapability {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "List the user's tasks, oldest first"
    }

    fn parameter_schema(&self) -> Option<ParameterSchema> {
        Some(
            ParameterSchema::new()
                .field(USER_ID, params::user_id_field())
                .field(
                    "completed",
                    FieldSpec::optional(FieldKind::Boolean)
                        .describe("Only completed (true) or only pending (false) tasks"),
                ),
        )
    }

    async fn execute(&self, parameters: Parameters) -> HandlerResult {
        let user_id = params::required_str(&parameters, USER_ID)?;
        let filter = TaskFilter {
            completed: params::optional_bool(&parameters, "completed")?,
        };

        let tasks = self.store.list(user_id, &filter).await?;
        Ok(json!({
            "count": tasks.len(),
            "tasks": params::to_value(&tasks)?,
        }))
    }
}
