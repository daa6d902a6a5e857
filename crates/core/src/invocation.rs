//! Invocation requests and the audit records they produce.

use crate::capability::Parameters;
use crate::envelope::InvocationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A request to run one capability on behalf of a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Name of the capability to run
    pub capability: String,

    /// Arguments, passed through to the handler as-is
    #[serde(default)]
    pub parameters: Parameters,

    /// Identity of the caller the invocation runs for
    pub caller_id: String,
}

impl InvocationRequest {
    pub fn new(capability: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            parameters: Parameters::new(),
            caller_id: caller_id.into(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// One audit log entry: what was attempted, by whom, and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub capability: String,
    pub caller_id: String,
    pub parameters: Parameters,
    pub result: InvocationResult,

    /// When the invocation finished
    pub timestamp: DateTime<Utc>,

    /// Wall-clock time spent, including any wait for a concurrency permit
    #[serde(default)]
    pub duration_ms: u64,
}

impl ToolCallRecord {
    /// Build a record stamped with the current time.
    pub fn completed(request: InvocationRequest, result: InvocationResult, elapsed: Duration) -> Self {
        Self {
            capability: request.capability,
            caller_id: request.caller_id,
            parameters: request.parameters,
            result,
            timestamp: Utc::now(),
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}
