//! Parameter extraction shared by the task capabilities.
//!
//! The executor has already checked types against each schema; these helpers
//! still fail cleanly when a capability is invoked directly.

use serde_json::{Map, Value};
use taskrelay_core::error::CapabilityError;
use taskrelay_core::schema::{FieldKind, FieldSpec};
use taskrelay_core::store::{MAX_CATEGORY_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, NewTask, TaskPatch};

/// Parameter carrying the caller identity.
pub const USER_ID: &str = "user_id";

pub(crate) fn user_id_field() -> FieldSpec {
    FieldSpec::required(FieldKind::String)
        .min_length(1)
        .describe("Identity of the task owner")
}

pub(crate) fn task_id_field() -> FieldSpec {
    FieldSpec::required(FieldKind::String)
        .min_length(1)
        .describe("ID of the task")
}

pub(crate) fn title_field(required: bool) -> FieldSpec {
    let spec = if required {
        FieldSpec::required(FieldKind::String)
    } else {
        FieldSpec::optional(FieldKind::String)
    };
    spec.min_length(1).max_length(MAX_TITLE_LENGTH).describe("Task title")
}

pub(crate) fn description_field() -> FieldSpec {
    FieldSpec::optional(FieldKind::String)
        .max_length(MAX_DESCRIPTION_LENGTH)
        .describe("Longer task description")
}

pub(crate) fn tags_field() -> FieldSpec {
    FieldSpec::optional(FieldKind::Array).describe("Free-form labels")
}

pub(crate) fn category_field() -> FieldSpec {
    FieldSpec::optional(FieldKind::String)
        .max_length(MAX_CATEGORY_LENGTH)
        .describe("Task category")
}

pub(crate) fn required_str<'a>(params: &'a Map<String, Value>, name: &str) -> Result<&'a str, CapabilityError> {
    match params.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(CapabilityError::invalid_field(name, format!("{name} is required")))
        }
        Some(_) => Err(CapabilityError::invalid_field(name, format!("{name} must be a string"))),
    }
}

fn optional_str(params: &Map<String, Value>, name: &str) -> Result<Option<String>, CapabilityError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CapabilityError::invalid_field(name, format!("{name} must be a string"))),
    }
}

pub(crate) fn optional_bool(params: &Map<String, Value>, name: &str) -> Result<Option<bool>, CapabilityError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(CapabilityError::invalid_field(name, format!("{name} must be a boolean"))),
    }
}

fn optional_tags(params: &Map<String, Value>) -> Result<Option<Vec<String>>, CapabilityError> {
    match params.get("tags") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| CapabilityError::invalid_field("tags", "tags must be a list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(CapabilityError::invalid_field("tags", "tags must be a list of strings")),
    }
}

/// Array of non-empty strings, e.g. `task_ids`.
pub(crate) fn string_list(params: &Map<String, Value>, name: &str) -> Result<Vec<String>, CapabilityError> {
    let invalid = || CapabilityError::invalid_field(name, format!("{name} must be a non-empty list of strings"));
    let items = params.get(name).and_then(Value::as_array).ok_or_else(invalid)?;
    if items.is_empty() {
        return Err(invalid());
    }
    items
        .iter()
        .map(|item| item.as_str().filter(|s| !s.is_empty()).map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Read task fields for creation. Does not run length checks.
pub(crate) fn new_task_from(params: &Map<String, Value>) -> Result<NewTask, CapabilityError> {
    Ok(NewTask {
        title: required_str(params, "title")?.to_string(),
        description: optional_str(params, "description")?,
        completed: optional_bool(params, "completed")?.unwrap_or(false),
        tags: optional_tags(params)?.unwrap_or_default(),
        category: optional_str(params, "category")?,
    })
}

/// Read patch fields. Keys outside the patchable set are ignored here and
/// rejected by the schema.
pub(crate) fn patch_from(params: &Map<String, Value>) -> Result<TaskPatch, CapabilityError> {
    Ok(TaskPatch {
        title: optional_str(params, "title")?,
        description: optional_str(params, "description")?,
        completed: optional_bool(params, "completed")?,
        tags: optional_tags(params)?,
        category: optional_str(params, "category")?,
    })
}

pub(crate) const PATCHABLE_FIELDS: [&str; 5] = ["title", "description", "completed", "tags", "category"];

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, CapabilityError> {
    serde_json::to_value(value).map_err(|e| CapabilityError::ExecutionFailed(format!("Failed to encode result: {e}")))
}
