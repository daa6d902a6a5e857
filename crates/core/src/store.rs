//! Task store trait: the persistence collaborator behind the task capabilities.
//!
//! Every operation is scoped to a caller: a record that exists but belongs to
//! someone else yields [`StoreError::Unauthorized`], never the record.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a task about to be created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        validate_category(self.category.as_deref())
    }
}

/// A partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_description(self.description.as_deref())?;
        validate_category(self.category.as_deref())
    }

    /// Apply to `task`, bumping `updated_at`.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(category) = self.category {
            task.category = Some(category);
        }
        task.updated_at = Utc::now();
    }
}

/// Listing filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.completed.is_none_or(|c| task.completed == c)
    }
}

pub fn validate_title(title: &str) -> Result<(), StoreError> {
    let len = title.chars().count();
    if title.trim().is_empty() || len > MAX_TITLE_LENGTH {
        return Err(StoreError::validation(
            "title",
            format!("Title is required and must be between 1-{MAX_TITLE_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_description(description: Option<&str>) -> Result<(), StoreError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(StoreError::validation(
            "description",
            format!("Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

pub fn validate_category(category: Option<&str>) -> Result<(), StoreError> {
    match category {
        Some(c) if c.chars().count() > MAX_CATEGORY_LENGTH => Err(StoreError::validation(
            "category",
            format!("Category exceeds maximum length of {MAX_CATEGORY_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

/// The core TaskStore trait.
///
/// Implementations: in-memory (tests, ephemeral sessions) and SQLite.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Backend name, for logs and diagnostics.
    fn name(&self) -> &str;

    /// Create a task owned by `user_id`.
    async fn create(&self, user_id: &str, task: NewTask) -> Result<Task, StoreError>;

    /// Fetch one task.
    async fn get(&self, user_id: &str, id: &str) -> Result<Task, StoreError>;

    /// All of the caller's tasks matching `filter`, oldest first.
    async fn list(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    /// Apply a partial update and return the updated task.
    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<Task, StoreError>;

    /// Delete a task.
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError>;
}

/// Shared ownership check used by store implementations.
pub fn ensure_owner(task: &Task, user_id: &str) -> Result<(), StoreError> {
    if task.user_id != user_id {
        return Err(StoreError::Unauthorized {
            user_id: user_id.to_string(),
            id: task.id.clone(),
        });
    }
    Ok(())
}
