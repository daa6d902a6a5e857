//! The orchestrator: one instruction in, one reply out.
//!
//! 1. **Classify** the instruction against the registered capability names
//! 2. **Execute** the plan once, if there is one (no retries)
//! 3. **Reply** from the envelope, or with the fallback when nothing matched

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use taskrelay_core::classifier::IntentClassifier;
use taskrelay_core::event::{DomainEvent, EventBus};
use taskrelay_core::invocation::{InvocationRequest, ToolCallRecord};
use taskrelay_core::message::ConversationTurn;
use tracing::{debug, info};

use crate::executor::Executor;
use crate::reply;

/// Parameter the caller identity is merged into, when a capability declares it.
pub const CALLER_PARAMETER: &str = "user_id";

const PREVIEW_CHARS: usize = 80;

/// Reply text plus the invocations made to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorReply {
    pub reply: String,
    pub invocations: Vec<ToolCallRecord>,
}

impl OrchestratorReply {
    /// Whether any capability ran for this reply.
    pub fn invoked(&self) -> bool {
        !self.invocations.is_empty()
    }
}

pub struct Orchestrator {
    classifier: Arc<dyn IntentClassifier>,
    executor: Arc<Executor>,
    timeout: Option<Duration>,
    event_bus: Option<Arc<EventBus>>,
}

impl Orchestrator {
    pub fn new(classifier: Arc<dyn IntentClassifier>, executor: Arc<Executor>) -> Self {
        Self {
            classifier,
            executor,
            timeout: None,
            event_bus: None,
        }
    }

    /// Per-invocation timeout; the executor default applies otherwise.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// Handle one instruction on behalf of `caller_id`.
    pub async fn handle(
        &self,
        instruction: &str,
        history: &[ConversationTurn],
        caller_id: &str,
    ) -> OrchestratorReply {
        self.publish(DomainEvent::InstructionReceived {
            caller_id: caller_id.to_string(),
            content_preview: instruction.chars().take(PREVIEW_CHARS).collect(),
            timestamp: Utc::now(),
        });

        let registry = self.executor.registry();
        let known = registry.names();

        let Some(plan) = self.classifier.classify(instruction, history, &known).await else {
            debug!(classifier = self.classifier.name(), caller_id, "No plan for instruction");
            self.publish(DomainEvent::FallbackReplied {
                caller_id: caller_id.to_string(),
                timestamp: Utc::now(),
            });
            return OrchestratorReply {
                reply: reply::fallback(&known),
                invocations: Vec::new(),
            };
        };

        info!(
            classifier = self.classifier.name(),
            capability = %plan.capability,
            caller_id,
            "Instruction classified"
        );

        let mut parameters = plan.parameters;
        let expects_caller = registry
            .lookup(&plan.capability)
            .is_some_and(|d| d.expects(CALLER_PARAMETER));
        if expects_caller {
            parameters.insert(CALLER_PARAMETER.into(), caller_id.into());
        }

        let request = InvocationRequest::new(plan.capability, caller_id).with_parameters(parameters);
        let record = self.executor.execute_recorded(request, self.timeout).await;
        let reply = reply::compose(&record.capability, &record.parameters, &record.result);

        OrchestratorReply {
            reply,
            invocations: vec![record],
        }
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}
