//! Capability abstraction: the named operations the orchestrator can invoke.
//!
//! A capability is described by a [`CapabilityDescriptor`]: a unique name,
//! an optional [`ParameterSchema`], and a [`Handler`]. Handlers come in two
//! flavours, an immediate computation or a suspendable task, and the executor
//! drives both through the same [`Handler::spawn`] entry point.

use crate::error::CapabilityError;
use crate::schema::ParameterSchema;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Arguments passed to a capability, keyed by parameter name.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// What a handler hands back: an opaque payload or a typed failure.
pub type HandlerResult = Result<serde_json::Value, CapabilityError>;

type SyncFn = dyn Fn(Parameters) -> HandlerResult + Send + Sync;
type AsyncFn = dyn Fn(Parameters) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A capability's executable body.
#[derive(Clone)]
pub enum Handler {
    /// Runs to completion without yielding. Executed on the blocking pool.
    Sync(Arc<SyncFn>),
    /// Suspends on I/O. Executed as a runtime task.
    Async(Arc<AsyncFn>),
}

impl Handler {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Parameters) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Parameters) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Async(Arc::new(move |params| f(params).boxed()))
    }

    /// Wrap a [`Capability`] implementation.
    pub fn from_capability(capability: Arc<dyn Capability>) -> Self {
        Self::Async(Arc::new(move |params| {
            let capability = Arc::clone(&capability);
            async move { capability.execute(params).await }.boxed()
        }))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// Start the handler on the current tokio runtime.
    ///
    /// Both variants yield a `JoinHandle`, so a panic surfaces as a
    /// `JoinError` rather than unwinding through the caller, and `abort()`
    /// stops an async handler at its next suspension point. Aborting a sync
    /// handler has no effect once it has started.
    pub fn spawn(&self, parameters: Parameters) -> JoinHandle<HandlerResult> {
        match self {
            Self::Sync(f) => {
                let f = Arc::clone(f);
                tokio::task::spawn_blocking(move || f(parameters))
            }
            Self::Async(f) => tokio::spawn(f(parameters)),
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// A self-describing capability.
///
/// Each task operation (add_task, list_tasks, ...) implements this trait and
/// is turned into a [`CapabilityDescriptor`] at registration time.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The unique name of this capability (e.g., "add_task").
    fn name(&self) -> &str;

    /// A one-line description for introspection.
    fn description(&self) -> &str;

    /// Declared parameters, if the capability validates its input.
    fn parameter_schema(&self) -> Option<ParameterSchema>;

    /// Run the capability.
    async fn execute(&self, parameters: Parameters) -> HandlerResult;
}

/// Registry entry for one capability. Immutable once built.
#[derive(Clone, Debug)]
pub struct CapabilityDescriptor {
    name: String,
    description: String,
    schema: Option<ParameterSchema>,
    handler: Handler,
}

impl CapabilityDescriptor {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            schema: None,
            handler,
        }
    }

    pub fn from_capability(capability: Arc<dyn Capability>) -> Self {
        Self {
            name: capability.name().to_string(),
            description: capability.description().to_string(),
            schema: capability.parameter_schema(),
            handler: Handler::from_capability(capability),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> Option<&ParameterSchema> {
        self.schema.as_ref()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Whether the schema declares `field`.
    pub fn expects(&self, field: &str) -> bool {
        self.schema.as_ref().is_some_and(|s| s.contains(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSpec};
    use serde_json::json;

    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameter_schema(&self) -> Option<ParameterSchema> {
            Some(ParameterSchema::new().field("text", FieldSpec::required(FieldKind::String)))
        }
        async fn execute(&self, parameters: Parameters) -> HandlerResult {
            Ok(parameters.get("text").cloned().unwrap_or_default())
        }
    }

    fn text(value: &str) -> Parameters {
        let mut params = Parameters::new();
        params.insert("text".into(), json!(value));
        params
    }

    #[tokio::test]
    async fn sync_and_async_handlers_share_spawn_path() {
        let sync = Handler::sync(|p| Ok(json!({"len": p.len()})));
        let asynchronous = Handler::from_async(|p: Parameters| async move { Ok(json!({"len": p.len()})) });

        assert!(!sync.is_async());
        assert!(asynchronous.is_async());

        let a = sync.spawn(text("x")).await.unwrap().unwrap();
        let b = asynchronous.spawn(text("x")).await.unwrap().unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn descriptor_from_capability() {
        let descriptor = CapabilityDescriptor::from_capability(Arc::new(EchoCapability));
        assert_eq!(descriptor.name(), "echo");
        assert!(descriptor.expects("text"));
        assert!(!descriptor.expects("user_id"));

        let output = descriptor.handler().spawn(text("hello")).await.unwrap().unwrap();
        assert_eq!(output, json!("hello"));
    }

    #[tokio::test]
    async fn handler_panic_surfaces_as_join_error() {
        let handler = Handler::sync(|_| panic!("boom"));
        let err = handler.spawn(Parameters::new()).await.unwrap_err();
        assert!(err.is_panic());
    }
}
