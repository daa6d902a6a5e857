//! Bulk capabilities: bulk_add_tasks and bulk_update_tasks.
//!
//! Every item is validated before the first write. Once writing starts, a
//! failing item is reported in `results` and the rest still run; the handler
//! itself succeeds and `summary.failed` carries the count.

use crate::params::{self, PATCHABLE_FIELDS, USER_ID};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use taskrelay_core::capability::{Capability, HandlerResult, Parameters};
use taskrelay_core::error::{CapabilityError, StoreError};
use taskrelay_core::schema::{FieldKind, FieldSpec, ParameterSchema};
use taskrelay_core::store::{NewTask, TaskPatch, TaskStore};
use tracing::{debug, warn};

/// Outcome of one item in a bulk operation.
#[derive(Debug, Clone, Serialize)]
struct ItemResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl ItemResult {
    fn success(task_id: String, title: Option<String>) -> Self {
        Self {
            task_id: Some(task_id),
            title,
            status: "success",
            error_message: None,
        }
    }

    fn failure(task_id: Option<String>, error: &StoreError) -> Self {
        Self {
            task_id,
            title: None,
            status: "error",
            error_message: Some(error.to_string()),
        }
    }
}

fn summarize(results: Vec<ItemResult>) -> HandlerResult {
    let successful = results.iter().filter(|r| r.status == "success").count();
    Ok(json!({
        "results": params::to_value(&results)?,
        "summary": {
            "total_processed": results.len(),
            "successful": successful,
            "failed": results.len() - successful,
        },
    }))
}

fn invalid(details: BTreeMap<String, String>) -> CapabilityError {
    CapabilityError::InvalidParameters {
        message: "Invalid parameters provided".into(),
        details,
    }
}

/// Collect per-field problems from a single-field error under `prefix`.
fn absorb(details: &mut BTreeMap<String, String>, prefix: &str, err: CapabilityError) {
    match err {
        CapabilityError::InvalidParameters { details: inner, .. } => {
            for (field, reason) in inner {
                details.insert(format!("{prefix}.{field}"), reason);
            }
        }
        other => {
            details.insert(prefix.to_string(), other.to_string());
        }
    }
}

fn reject_unknown_keys(details: &mut BTreeMap<String, String>, prefix: &str, item: &Map<String, Value>) {
    for key in item.keys().filter(|k| !PATCHABLE_FIELDS.contains(&k.as_str())) {
        details.insert(format!("{prefix}.{key}"), format!("{key} is not a recognized field"));
    }
}

pub struct BulkAddTasksCapability {
    store: Arc<dyn TaskStore>,
}

impl BulkAddTasksCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    fn parse_items(parameters: &Parameters) -> Result<Vec<NewTask>, CapabilityError> {
        let items = parameters
            .get("tasks")
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .ok_or_else(|| CapabilityError::invalid_field("tasks", "tasks must be a non-empty list"))?;

        let mut details = BTreeMap::new();
        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let prefix = format!("tasks[{index}]");
            let Some(item) = item.as_object() else {
                details.insert(prefix, "each task must be an object".into());
                continue;
            };
            reject_unknown_keys(&mut details, &prefix, item);
            match params::new_task_from(item) {
                Ok(task) => match task.validate() {
                    Ok(()) => parsed.push(task),
                    Err(e) => absorb(&mut details, &prefix, e.into()),
                },
                Err(e) => absorb(&mut details, &prefix, e),
            }
        }

        if details.is_empty() { Ok(parsed) } else { Err(invalid(details)) }
    }
}

#[async_trait]
impl Capability for BulkAddTasksCapability {
    fn name(&self) -> &str {
        "bulk_add_tasks"
    }

    fn description(&self) -> &str {
        "Create several tasks in one call"
    }

    fn parameter_schema(&self) -> Option<ParameterSchema> {
        Some(
            ParameterSchema::new()
                .field(USER_ID, params::user_id_field())
                .field(
                    "tasks",
                    FieldSpec::required(FieldKind::Array)
                        .min_length(1)
                        .describe("Tasks to create: {title, description?, completed?, tags?, category?}"),
                ),
        )
    }

    async fn execute(&self, parameters: Parameters) -> HandlerResult {
        let user_id = params::required_str(&parameters, USER_ID)?;
        let items = Self::parse_items(&parameters)?;

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            match self.store.create(user_id, item).await {
                Ok(task) => results.push(ItemResult::success(task.id, Some(task.title))),
                Err(e) => {
                    warn!(user_id, error = %e, "Bulk add item failed");
                    results.push(ItemResult::failure(None, &e));
                }
            }
        }

        debug!(user_id, count = results.len(), "Bulk add processed");
        summarize(results)
    }
}

pub struct BulkUpdateTasksCapability {
    store: Arc<dyn TaskStore>,
}

impl BulkUpdateTasksCapability {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    fn parse_updates(parameters: &Parameters) -> Result<TaskPatch, CapabilityError> {
        let updates = parameters
            .get("updates")
            .and_then(Value::as_object)
            .filter(|updates| !updates.is_empty())
            .ok_or_else(|| CapabilityError::invalid_field("updates", "updates must be a non-empty object"))?;

        let mut details = BTreeMap::new();
        reject_unknown_keys(&mut details, "updates", updates);
        if !details.is_empty() {
            return Err(invalid(details));
        }

        let patch = params::patch_from(updates)?;
        patch.validate()?;
        Ok(patch)
    }
}

#[async_trait]
impl Capability for BulkUpdateTasksCapability {
    fn name(&self) -> &str {
        "bulk_update_tasks"
    }

    fn description(&self) -> &str {
        "Apply the same update to several tasks"
    }

    fn parameter_schema(&self) -> Option<ParameterSchema> {
        Some(
            ParameterSchema::new()
                .field(USER_ID, params::user_id_field())
                .field(
                    "task_ids",
                    FieldSpec::required(FieldKind::Array)
                        .min_length(1)
                        .describe("IDs of the tasks to update"),
                )
                .field(
                    "updates",
                    FieldSpec::required(FieldKind::Object)
                        .describe("Fields to set: title, description, completed, tags, category"),
                ),
        )
    }

    async fn execute(&self, parameters: Parameters) -> HandlerResult {
        let user_id = params::required_str(&parameters, USER_ID)?;
        let task_ids = params::string_list(&parameters, "task_ids")?;
        let patch = Self::parse_updates(&parameters)?;

        let mut results = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            match self.store.update(user_id, &task_id, patch.clone()).await {
                Ok(task) => results.push(ItemResult::success(task.id, None)),
                Err(e) => {
                    warn!(user_id, task_id = %task_id, error = %e, "Bulk update item failed");
                    results.push(ItemResult::failure(Some(task_id), &e));
                }
            }
        }

        summarize(results)
    }
}
