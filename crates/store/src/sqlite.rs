//! SQLite task store.
//!
//! One `tasks` table. Tags are stored as a JSON array in a TEXT column and
//! timestamps as RFC 3339 strings. The integer `iid` column gives a stable
//! creation order for listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use taskrelay_core::error::StoreError;
use taskrelay_core::store::{NewTask, Task, TaskFilter, TaskPatch, TaskStore, ensure_owner};
use tracing::{debug, info};
use uuid::Uuid;

/// A persistent task store backed by a single SQLite file.
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool).await?;
        info!("SQLite task store initialized at {}", path.display());
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT UNIQUE NOT NULL,
                user_id      TEXT NOT NULL,
                title        TEXT NOT NULL,
                description  TEXT,
                completed    INTEGER NOT NULL DEFAULT 0,
                tags         TEXT NOT NULL DEFAULT '[]',
                category     TEXT,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("tasks table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id, iid)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("user_id index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_task(row: &SqliteRow) -> Result<Task, StoreError> {
        let column = |name: &str, e: sqlx::Error| StoreError::Storage(format!("{name} column: {e}"));

        let tags_json: String = row.try_get("tags").map_err(|e| column("tags", e))?;
        let created_at: String = row.try_get("created_at").map_err(|e| column("created_at", e))?;
        let updated_at: String = row.try_get("updated_at").map_err(|e| column("updated_at", e))?;

        Ok(Task {
            id: row.try_get("id").map_err(|e| column("id", e))?,
            user_id: row.try_get("user_id").map_err(|e| column("user_id", e))?,
            title: row.try_get("title").map_err(|e| column("title", e))?,
            description: row.try_get("description").map_err(|e| column("description", e))?,
            completed: row.try_get("completed").map_err(|e| column("completed", e))?,
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            category: row.try_get("category").map_err(|e| column("category", e))?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    async fn fetch(&self, id: &str) -> Result<Task, StoreError> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("GET by ID: {e}")))?;

        match row {
            Some(ref r) => Self::row_to_task(r),
            None => Err(StoreError::task_not_found(id)),
        }
    }

    async fn fetch_owned(&self, user_id: &str, id: &str) -> Result<Task, StoreError> {
        let task = self.fetch(id).await?;
        ensure_owner(&task, user_id)?;
        Ok(task)
    }

    /// Why a write scoped to `(id, user_id)` touched no row.
    async fn missed(&self, user_id: &str, id: &str) -> StoreError {
        self.fetch_owned(user_id, id)
            .await
            .err()
            .unwrap_or_else(|| StoreError::task_not_found(id))
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn tags_to_json(tags: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(tags).map_err(|e| StoreError::Storage(format!("Tags serialization: {e}")))
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn name(&self) -> &str {
        "sqlite"
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

        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, title, description, completed, tags, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&task.id)
        .bind(&task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(tags_to_json(&task.tags)?)
        .bind(&task.category)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;

        debug!(task_id = %task.id, user_id, "Stored task");
        Ok(task)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Task, StoreError> {
        self.fetch_owned(user_id, id).await
    }

    async fn list(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let rows = match filter.completed {
            Some(completed) => {
                sqlx::query("SELECT * FROM tasks WHERE user_id = ?1 AND completed = ?2 ORDER BY iid")
                    .bind(user_id)
                    .bind(completed)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM tasks WHERE user_id = ?1 ORDER BY iid")
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| StoreError::Storage(format!("LIST failed: {e}")))?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<Task, StoreError> {
        patch.validate()?;
        let tags = patch.tags.as_deref().map(tags_to_json).transpose()?;

        // Unpatched columns keep their stored value, so concurrent patches
        // to different fields both land.
        let row = sqlx::query(
            r#"
            UPDATE tasks SET
                title       = COALESCE(?1, title),
                description = COALESCE(?2, description),
                completed   = COALESCE(?3, completed),
                tags        = COALESCE(?4, tags),
                category    = COALESCE(?5, category),
                updated_at  = ?6
            WHERE id = ?7 AND user_id = ?8
            RETURNING *
            "#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.completed)
        .bind(tags)
        .bind(&patch.category)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("UPDATE failed: {e}")))?;

        match row {
            Some(ref r) => Self::row_to_task(r),
            None => Err(self.missed(user_id, id).await),
        }
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(self.missed(user_id, id).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (SqliteTaskStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTaskStore::open(dir.path().join("tasks.sqlite")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn create_get_roundtrip() {
        let (store, _dir) = test_store().await;
        let created = store
            .create(
                "alice",
                NewTask {
                    title: "Write report".into(),
                    description: Some("quarterly".into()),
                    tags: vec!["work".into(), "urgent".into()],
                    category: Some("office".into()),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();

        let fetched = store.get("alice", &created.id).await.unwrap();
        assert_eq!(fetched.title, "Write report");
        assert_eq!(fetched.description.as_deref(), Some("quarterly"));
        assert_eq!(fetched.tags, vec!["work", "urgent"]);
        assert_eq!(fetched.category.as_deref(), Some("office"));
        assert!(!fetched.completed);
    }

    #[tokio::test]
    async fn list_scoped_ordered_and_filtered() {
        let (store, _dir) = test_store().await;
        let a = store.create("alice", NewTask::titled("a")).await.unwrap();
        store.create("bob", NewTask::titled("b")).await.unwrap();
        store.create("alice", NewTask::titled("c")).await.unwrap();
        store
            .update(
                "alice",
                &a.id,
                TaskPatch {
                    completed: Some(true),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        let all: Vec<_> = store
            .list("alice", &TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(all, vec!["a", "c"]);

        let pending = store
            .list("alice", &TaskFilter { completed: Some(false) })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "c");
    }

    #[tokio::test]
    async fn ownership_enforced() {
        let (store, _dir) = test_store().await;
        let task = store.create("alice", NewTask::titled("mine")).await.unwrap();

        let err = store
            .update("mallory", &task.id, TaskPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized { .. }));
        assert!(matches!(
            store.delete("mallory", &task.id).await,
            Err(StoreError::Unauthorized { .. })
        ));
        assert!(store.get("alice", &task.id).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_patches_to_different_fields_both_apply() {
        let (store, _dir) = test_store().await;
        let task = store.create("alice", NewTask::titled("x")).await.unwrap();

        let complete = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let retitle = TaskPatch {
            title: Some("y".into()),
            ..TaskPatch::default()
        };
        let (a, b) = tokio::join!(
            store.update("alice", &task.id, complete),
            store.update("alice", &task.id, retitle),
        );
        a.unwrap();
        b.unwrap();

        let stored = store.get("alice", &task.id).await.unwrap();
        assert!(stored.completed);
        assert_eq!(stored.title, "y");
    }

    #[tokio::test]
    async fn update_keeps_unpatched_fields() {
        let (store, _dir) = test_store().await;
        let task = store
            .create(
                "alice",
                NewTask {
                    title: "keep".into(),
                    tags: vec!["home".into()],
                    category: Some("chores".into()),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();

        let updated = store
            .update(
                "alice",
                &task.id,
                TaskPatch {
                    description: Some("now with notes".into()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "keep");
        assert_eq!(updated.tags, vec!["home"]);
        assert_eq!(updated.category.as_deref(), Some("chores"));
        assert_eq!(updated.description.as_deref(), Some("now with notes"));
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_task_are_not_found() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.update("alice", "ghost", TaskPatch::default()).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("alice", "ghost").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_then_not_found() {
        let (store, _dir) = test_store().await;
        let task = store.create("alice", NewTask::titled("temp")).await.unwrap();
        store.delete("alice", &task.id).await.unwrap();
        assert!(matches!(
            store.get("alice", &task.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.sqlite");
        let id = {
            let store = SqliteTaskStore::open(&path).await.unwrap();
            store.create("alice", NewTask::titled("persist")).await.unwrap().id
        };

        let store = SqliteTaskStore::open(&path).await.unwrap();
        assert_eq!(store.get("alice", &id).await.unwrap().title, "persist");
    }
}
