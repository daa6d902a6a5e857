//! In-memory backend: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use taskrelay_core::error::StoreError;
use taskrelay_core::store::{NewTask, Task, TaskFilter, TaskPatch, TaskStore, ensure_owner};
use tokio::sync::RwLock;
use uuid::Uuid;

/// An in-memory store that keeps tasks in a Vec, in creation order.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of tasks across all users.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

fn position(tasks: &[Task], user_id: &str, id: &str) -> Result<usize, StoreError> {
    let index = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| StoreError::task_not_found(id))?;
    ensure_owner(&tasks[index], user_id)?;
    Ok(index)
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create(&self, user_id: &str, task: NewTask) -> Result<Task, StoreError> {
        task.validate()?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: task.title,
            description: task.description,
            completed: task.completed,
            tags: task.tags,
            category: task.category,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Task, StoreError> {
        let tasks = self.tasks.read().await;
        let index = position(&tasks, user_id, id)?;
        Ok(tasks[index].clone())
    }

    async fn list(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<Task, StoreError> {
        patch.validate()?;
        let mut tasks = self.tasks.write().await;
        let index = position(&tasks, user_id, id)?;
        let task = &mut tasks[index];
        patch.apply(task);
        Ok(task.clone())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let index = position(&tasks, user_id, id)?;
        tasks.remove(index);
        Ok(())
    }
}
