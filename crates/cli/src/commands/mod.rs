pub mod audit;
pub mod capabilities;
pub mod chat;
pub mod config_cmd;
pub mod invoke;

use std::sync::Arc;

use taskrelay_agent::{Executor, KeywordClassifier, Orchestrator};
use taskrelay_audit::{AuditLogger, AuditSink, JsonlSink, TracingSink};
use taskrelay_config::AppConfig;
use taskrelay_core::event::EventBus;
use taskrelay_core::store::TaskStore;
use taskrelay_store::{InMemoryTaskStore, SqliteTaskStore};

/// Everything a command needs, wired from config.
pub struct Runtime {
    pub executor: Arc<Executor>,
    pub orchestrator: Orchestrator,
}

pub async fn build_runtime(config: &AppConfig) -> Result<Runtime, Box<dyn std::error::Error>> {
    let store: Arc<dyn TaskStore> = match config.store.backend.as_str() {
        "sqlite" => {
            let path = config.store_path();
            tracing::debug!(path = %path.display(), "Opening sqlite task store");
            Arc::new(SqliteTaskStore::open(&path).await?)
        }
        _ => Arc::new(InMemoryTaskStore::new()),
    };

    let mut sinks: Vec<Box<dyn AuditSink>> = Vec::new();
    if config.audit.tracing {
        sinks.push(Box::new(TracingSink));
    }
    sinks.push(Box::new(JsonlSink::new(config.audit.resolved_jsonl_path())));

    let registry = Arc::new(taskrelay_tools::default_registry(store));
    let event_bus = Arc::new(EventBus::default());
    let executor = Arc::new(
        Executor::new(registry, Arc::new(AuditLogger::with_sinks(sinks)))
            .with_default_timeout(config.executor.timeout())
            .with_max_concurrent(config.executor.max_concurrent)
            .with_event_bus(event_bus.clone()),
    );

    let classifier = if config.classifier.restrict_to_known {
        KeywordClassifier::restricted_to_known()
    } else {
        KeywordClassifier::new()
    };
    let orchestrator =
        Orchestrator::new(Arc::new(classifier), executor.clone()).with_event_bus(event_bus);

    Ok(Runtime {
        executor,
        orchestrator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.audit.tracing = false;
        config.audit.jsonl_path = Some(dir.path().join("audit.jsonl").display().to_string());
        config
    }

    #[tokio::test]
    async fn runtime_registers_default_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = build_runtime(&config_in(&dir)).await.unwrap();

        let names = runtime.executor.registry().names();
        assert!(names.contains(&"add_task".to_string()));
        assert!(names.contains(&"bulk_update_tasks".to_string()));
        assert_eq!(runtime.executor.default_timeout(), config_in(&dir).executor.timeout());
    }

    #[tokio::test]
    async fn runtime_writes_jsonl_audit() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = build_runtime(&config_in(&dir)).await.unwrap();

        runtime.orchestrator.handle("add task water plants", &[], "alice").await;

        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("add_task"));
    }

    #[tokio::test]
    async fn sqlite_backend_opens_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.store.backend = "sqlite".into();
        config.store.path = Some(dir.path().join("tasks.sqlite").display().to_string());

        let runtime = build_runtime(&config).await.unwrap();
        let reply = runtime.orchestrator.handle("add task file taxes", &[], "alice").await;

        assert!(reply.invocations[0].is_success());
        assert!(dir.path().join("tasks.sqlite").exists());
    }
}
