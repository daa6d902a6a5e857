//! End-to-end integration tests for taskrelay.
//!
//! These tests drive the full pipeline from instruction to reply: keyword
//! classification, dispatch through the executor, the built-in task
//! capabilities on a real store, and the audit trail.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use taskrelay_agent::{Executor, KeywordClassifier, Orchestrator, OrchestratorReply};
use taskrelay_audit::{AuditLogger, AuditQuery, AuditSink, JsonlSink};
use taskrelay_core::capability::{CapabilityDescriptor, Handler, Parameters};
use taskrelay_core::envelope::ErrorKind;
use taskrelay_core::invocation::InvocationRequest;
use taskrelay_core::registry::CapabilityRegistry;
use taskrelay_core::schema::{FieldKind, FieldSpec, ParameterSchema};
use taskrelay_core::store::TaskStore;
use taskrelay_store::{InMemoryTaskStore, SqliteTaskStore};
use taskrelay_tools::default_registry;

// ── Fixtures ─────────────────────────────────────────────────────────────

fn orchestrator_with(registry: CapabilityRegistry, audit: AuditLogger) -> Orchestrator {
    let executor = Executor::new(Arc::new(registry), Arc::new(audit));
    Orchestrator::new(Arc::new(KeywordClassifier::new()), Arc::new(executor))
}

fn task_orchestrator(store: Arc<dyn TaskStore>) -> Orchestrator {
    orchestrator_with(default_registry(store), AuditLogger::new())
}

fn params(value: Value) -> Parameters {
    value.as_object().cloned().unwrap()
}

fn task_id_of(reply: &OrchestratorReply) -> String {
    reply.invocations[0].result.result().unwrap()["task_id"]
        .as_str()
        .unwrap()
        .to_string()
}

// ── E2E: Conversation Against The Task Capabilities ─────────────────────

#[tokio::test]
async fn e2e_task_lifecycle_through_chat() {
    let orchestrator = task_orchestrator(Arc::new(InMemoryTaskStore::new()));

    let added = orchestrator.handle("add task buy milk", &[], "alice").await;
    assert_eq!(added.reply, "I've added the task 'buy milk' to your list.");
    let milk = task_id_of(&added);

    orchestrator.handle("create todo call the plumber", &[], "alice").await;

    let listed = orchestrator.handle("list tasks", &[], "alice").await;
    assert_eq!(listed.reply, "Here are your tasks:\n- buy milk\n- call the plumber");

    let completed = orchestrator
        .handle(&format!("mark task {milk} as done"), &[], "alice")
        .await;
    assert!(completed.invocations[0].is_success());
    assert_eq!(completed.reply, format!("I've marked task {milk} as completed."));

    let done = orchestrator.handle("show completed tasks", &[], "alice").await;
    assert_eq!(done.reply, "Here are your tasks:\n- buy milk");
    let pending = orchestrator.handle("show pending tasks", &[], "alice").await;
    assert_eq!(pending.reply, "Here are your tasks:\n- call the plumber");

    let renamed = orchestrator
        .handle(&format!("rename task {milk} to buy oat milk"), &[], "alice")
        .await;
    assert!(renamed.invocations[0].is_success());
    assert_eq!(renamed.invocations[0].parameters["title"], json!("buy oat milk"));

    let deleted = orchestrator.handle(&format!("delete task {milk}"), &[], "alice").await;
    assert_eq!(deleted.reply, format!("I've deleted task {milk}."));

    let remaining = orchestrator.handle("list tasks", &[], "alice").await;
    assert_eq!(remaining.reply, "Here are your tasks:\n- call the plumber");
    assert_eq!(orchestrator.executor().audit().count(), 9);
}

#[tokio::test]
async fn e2e_callers_are_isolated() {
    let orchestrator = task_orchestrator(Arc::new(InMemoryTaskStore::new()));

    let added = orchestrator.handle("add task private note", &[], "alice").await;
    let id = task_id_of(&added);

    let listed = orchestrator.handle("list tasks", &[], "bob").await;
    assert_eq!(listed.reply, "You don't have any tasks.");

    let stolen = orchestrator.handle(&format!("delete task {id}"), &[], "bob").await;
    assert_eq!(
        stolen.invocations[0].result.error_kind(),
        Some(ErrorKind::UnauthorizedAccess)
    );
    assert!(stolen.reply.starts_with("Sorry, I couldn't delete the task"));

    let missing = orchestrator.handle("finish task does-not-exist", &[], "alice").await;
    assert_eq!(missing.invocations[0].result.error_kind(), Some(ErrorKind::NotFound));
}

// ── E2E: Reference Scenarios ─────────────────────────────────────────────

#[tokio::test]
async fn e2e_add_task_scenario_reply_contains_title() {
    let registry = CapabilityRegistry::new();
    registry.register(
        CapabilityDescriptor::new("add_task", Handler::sync(|_| Ok(json!({"taskId": "t-42"}))))
            .with_schema(ParameterSchema::new().field("title", FieldSpec::required(FieldKind::String))),
    );
    let orchestrator = orchestrator_with(registry, AuditLogger::new());

    let reply = orchestrator.handle("add task buy milk", &[], "alice").await;

    assert!(reply.reply.contains("buy milk"));
    assert_eq!(reply.invocations.len(), 1);
    assert_eq!(reply.invocations[0].parameters["title"], json!("buy milk"));
    assert_eq!(reply.invocations[0].result.result(), Some(&json!({"taskId": "t-42"})));
}

#[tokio::test]
async fn e2e_list_without_registration_is_not_found() {
    let orchestrator = orchestrator_with(CapabilityRegistry::new(), AuditLogger::new());

    let reply = orchestrator.handle("list tasks", &[], "alice").await;

    assert!(reply.reply.starts_with("Sorry"));
    assert_eq!(reply.invocations.len(), 1);
    assert!(!reply.invocations[0].is_success());
    assert_eq!(reply.invocations[0].result.error_kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn e2e_unmatched_instruction_falls_back() {
    let orchestrator = task_orchestrator(Arc::new(InMemoryTaskStore::new()));

    let reply = orchestrator.handle("what is the weather", &[], "alice").await;

    assert!(reply.invocations.is_empty());
    assert!(reply.reply.starts_with("I'm not sure how to help with that."));
    assert!(reply.reply.contains("add_task"));
    assert_eq!(orchestrator.executor().audit().count(), 0);
}

// ── E2E: Executor Guarantees With Real Capabilities ─────────────────────

#[tokio::test]
async fn e2e_missing_title_never_reaches_store() {
    let store = Arc::new(InMemoryTaskStore::new());
    let executor = Executor::new(
        Arc::new(default_registry(store.clone())),
        Arc::new(AuditLogger::new()),
    );

    let result = executor
        .execute(
            InvocationRequest::new("add_task", "alice")
                .with_parameters(params(json!({"user_id": "alice"}))),
            None,
        )
        .await;

    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::ValidationError);
    assert!(error.details.as_ref().unwrap().contains_key("title"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn e2e_listing_is_idempotent() {
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
    let executor = Executor::new(Arc::new(default_registry(store)), Arc::new(AuditLogger::new()));
    executor
        .execute(
            InvocationRequest::new("add_task", "alice")
                .with_parameters(params(json!({"user_id": "alice", "title": "one"}))),
            None,
        )
        .await;

    let list = || {
        InvocationRequest::new("list_tasks", "alice").with_parameters(params(json!({"user_id": "alice"})))
    };
    let first = executor.execute(list(), None).await;
    let second = executor.execute(list(), None).await;

    assert!(first.is_success());
    assert_eq!(first.result(), second.result());
}

#[tokio::test]
async fn e2e_bulk_add_then_bulk_complete() {
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
    let executor = Executor::new(Arc::new(default_registry(store)), Arc::new(AuditLogger::new()));

    let added = executor
        .execute(
            InvocationRequest::new("bulk_add_tasks", "alice").with_parameters(params(json!({
                "user_id": "alice",
                "tasks": [{"title": "a"}, {"title": "b", "tags": ["x"]}],
            }))),
            None,
        )
        .await;
    let added = added.result().unwrap();
    assert_eq!(added["summary"]["successful"], json!(2));

    let ids: Vec<Value> = added["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["task_id"].clone())
        .chain(std::iter::once(json!("ghost")))
        .collect();

    let updated = executor
        .execute(
            InvocationRequest::new("bulk_update_tasks", "alice").with_parameters(params(json!({
                "user_id": "alice",
                "task_ids": ids,
                "updates": {"completed": true},
            }))),
            None,
        )
        .await;
    let summary = &updated.result().unwrap()["summary"];
    assert_eq!(summary["total_processed"], json!(3));
    assert_eq!(summary["successful"], json!(2));
    assert_eq!(summary["failed"], json!(1));
}

#[tokio::test]
async fn e2e_slow_capability_times_out_and_is_audited() {
    let registry = default_registry(Arc::new(InMemoryTaskStore::new()));
    registry.register(CapabilityDescriptor::new(
        "list_tasks",
        Handler::from_async(|_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!({"tasks": []}))
        }),
    ));
    let executor = Executor::new(Arc::new(registry), Arc::new(AuditLogger::new()))
        .with_default_timeout(Duration::from_millis(50));
    let orchestrator = Orchestrator::new(Arc::new(KeywordClassifier::new()), Arc::new(executor));

    let reply = orchestrator.handle("list tasks", &[], "alice").await;

    assert_eq!(reply.invocations[0].result.error_kind(), Some(ErrorKind::Timeout));
    assert!(reply.reply.contains("timed out"));
    let logged = orchestrator.executor().audit().entries();
    assert_eq!(logged, reply.invocations);
}

// ── E2E: Audit Trail On Disk ─────────────────────────────────────────────

#[tokio::test]
async fn e2e_jsonl_audit_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let sinks: Vec<Box<dyn AuditSink>> = vec![Box::new(JsonlSink::new(&path))];
    let orchestrator = orchestrator_with(
        default_registry(Arc::new(InMemoryTaskStore::new())),
        AuditLogger::with_sinks(sinks),
    );

    orchestrator.handle("add task alpha", &[], "alice").await;
    orchestrator.handle("add task beta", &[], "bob").await;
    orchestrator.handle("list tasks", &[], "alice").await;
    orchestrator.handle("hello there", &[], "alice").await;

    let all: Vec<_> = JsonlSink::read(&path, &AuditQuery::new()).unwrap().collect();
    assert_eq!(all, orchestrator.executor().audit().entries());

    let alice: Vec<_> = JsonlSink::read(&path, &AuditQuery::new().caller("alice"))
        .unwrap()
        .collect();
    assert_eq!(alice.len(), 2);

    let adds = JsonlSink::read(&path, &AuditQuery::new().capability("add_task"))
        .unwrap()
        .count();
    assert_eq!(adds, 2);
    assert_eq!(orchestrator.executor().audit().sink_failures(), 0);
}

// ── E2E: SQLite Store ────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_sqlite_tasks_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("tasks.sqlite");

    {
        let store = SqliteTaskStore::open(&db).await.unwrap();
        let orchestrator = task_orchestrator(Arc::new(store));
        let reply = orchestrator.handle("add task renew passport", &[], "alice").await;
        assert!(reply.invocations[0].is_success());
    }

    let store = SqliteTaskStore::open(&db).await.unwrap();
    let orchestrator = task_orchestrator(Arc::new(store));
    let listed = orchestrator.handle("list tasks", &[], "alice").await;
    assert_eq!(listed.reply, "Here are your tasks:\n- renew passport");
}
