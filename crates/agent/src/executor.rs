//! The executor: runs one capability invocation end to end.
//!
//! Lookup, schema validation, handler dispatch under a timeout, folding of
//! every outcome into an [`InvocationResult`], then an audit record. Nothing
//! raised by a handler escapes as a Rust error or a panic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use taskrelay_audit::AuditLogger;
use taskrelay_core::capability::CapabilityDescriptor;
use taskrelay_core::envelope::{ErrorKind, InvocationError, InvocationResult};
use taskrelay_core::event::{DomainEvent, EventBus};
use taskrelay_core::invocation::{InvocationRequest, ToolCallRecord};
use taskrelay_core::registry::CapabilityRegistry;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Dispatches invocation requests against a registry.
pub struct Executor {
    registry: Arc<CapabilityRegistry>,
    audit: Arc<AuditLogger>,
    default_timeout: Duration,
    permits: Arc<Semaphore>,
    event_bus: Option<Arc<EventBus>>,
}

impl Executor {
    pub fn new(registry: Arc<CapabilityRegistry>, audit: Arc<AuditLogger>) -> Self {
        Self {
            registry,
            audit,
            default_timeout: DEFAULT_TIMEOUT,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
            event_bus: None,
        }
    }

    /// Timeout used when a request does not specify one.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Maximum handler invocations in flight at once.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn audit(&self) -> &Arc<AuditLogger> {
        &self.audit
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run `request` and return its envelope.
    ///
    /// `timeout` of `None` uses the default. The audit record is appended
    /// before this returns.
    pub async fn execute(&self, request: InvocationRequest, timeout: Option<Duration>) -> InvocationResult {
        self.execute_recorded(request, timeout).await.result
    }

    /// Run `request` and return the audit record that was appended for it.
    pub async fn execute_recorded(
        &self,
        request: InvocationRequest,
        timeout: Option<Duration>,
    ) -> ToolCallRecord {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();

        let result = self.dispatch(&request, timeout).await;
        let record = ToolCallRecord::completed(request, result, started.elapsed());

        match record.result.error() {
            None => info!(
                capability = %record.capability,
                caller_id = %record.caller_id,
                duration_ms = record.duration_ms,
                "Capability invoked"
            ),
            Some(error) => warn!(
                capability = %record.capability,
                caller_id = %record.caller_id,
                duration_ms = record.duration_ms,
                kind = %error.kind,
                error = %error.message,
                "Capability invocation failed"
            ),
        }

        self.audit.append(record.clone());

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::CapabilityInvoked {
                capability: record.capability.clone(),
                caller_id: record.caller_id.clone(),
                success: record.is_success(),
                duration_ms: record.duration_ms,
                timestamp: Utc::now(),
            });
        }

        record
    }

    async fn dispatch(&self, request: &InvocationRequest, timeout: Duration) -> InvocationResult {
        let Some(descriptor) = self.registry.lookup(&request.capability) else {
            return InvocationResult::err(InvocationError::capability_not_found(&request.capability));
        };

        if let Some(schema) = descriptor.schema() {
            if let Err(details) = schema.validate(&request.parameters) {
                debug!(capability = %request.capability, ?details, "Parameters rejected");
                return InvocationResult::err(InvocationError::validation(details));
            }
        }

        self.run_handler(&descriptor, request, timeout).await
    }

    async fn run_handler(
        &self,
        descriptor: &CapabilityDescriptor,
        request: &InvocationRequest,
        timeout: Duration,
    ) -> InvocationResult {
        let name = descriptor.name();
        let deadline = deadline_after(timeout);

        // Waiting for a permit counts against the deadline
        let _permit = match tokio::time::timeout_at(deadline, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return InvocationResult::err(InvocationError::new(
                    ErrorKind::ExecutionError,
                    "Executor is shut down",
                ));
            }
            Err(_) => return InvocationResult::err(InvocationError::timeout(name, timeout)),
        };

        let mut handle = descriptor.handler().spawn(request.parameters.clone());
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(Ok(value))) => InvocationResult::ok(value),
            Ok(Ok(Err(error))) => InvocationResult::err(error.into()),
            Ok(Err(join_error)) => InvocationResult::err(InvocationError::new(
                ErrorKind::ExecutionError,
                format!("Capability '{name}' failed: {}", join_failure(join_error)),
            )),
            Err(_) => {
                // Async handlers stop at their next await; blocking ones run to completion
                handle.abort();
                InvocationResult::err(InvocationError::timeout(name, timeout))
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .field("default_timeout", &self.default_timeout)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

/// Ceiling for deadlines that would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(timeout: Duration) -> tokio::time::Instant {
    let now = tokio::time::Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

fn join_failure(error: JoinError) -> String {
    if error.is_cancelled() {
        return "handler was cancelled".into();
    }
    match error.try_into_panic() {
        Ok(payload) => {
            if let Some(message) = payload.downcast_ref::<&str>() {
                format!("handler panicked: {message}")
            } else if let Some(message) = payload.downcast_ref::<String>() {
                format!("handler panicked: {message}")
            } else {
                "handler panicked".into()
            }
        }
        Err(error) => error.to_string(),
    }
}
