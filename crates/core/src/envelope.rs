//! The uniform result envelope returned by every capability invocation.
//!
//! On the wire an envelope is `{"success": true, "result": ...}` or
//! `{"success": false, "error": {"kind", "message", "details"?}}`. In Rust it
//! wraps a plain `Result`, so `success == error.is_none()` holds by
//! construction and deserialization rejects anything else.

use crate::error::CapabilityError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Closed taxonomy of invocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Capability or referenced record absent
    NotFound,
    /// Malformed or missing parameters
    ValidationError,
    /// Caller lacks rights over an existing record
    UnauthorizedAccess,
    /// Unexpected handler fault
    ExecutionError,
    /// Handler exceeded its allotted time
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::ValidationError => "ValidationError",
            Self::UnauthorizedAccess => "UnauthorizedAccess",
            Self::ExecutionError => "ExecutionError",
            Self::Timeout => "Timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `error` half of a failed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

impl InvocationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn capability_not_found(name: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("Capability '{name}' not found"))
    }

    pub fn validation(details: BTreeMap<String, String>) -> Self {
        Self::new(ErrorKind::ValidationError, "Invalid parameters provided").with_details(details)
    }

    pub fn timeout(name: &str, after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Capability '{name}' timed out after {}ms", after.as_millis()),
        )
    }
}

impl From<CapabilityError> for InvocationError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::NotFound(message) => Self::new(ErrorKind::NotFound, message),
            CapabilityError::InvalidParameters { message, details } => {
                Self::new(ErrorKind::ValidationError, message).with_details(details)
            }
            CapabilityError::Unauthorized(message) => {
                Self::new(ErrorKind::UnauthorizedAccess, message)
            }
            CapabilityError::ExecutionFailed(message) => {
                Self::new(ErrorKind::ExecutionError, message)
            }
        }
    }
}

/// The envelope itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawEnvelope", try_from = "RawEnvelope")]
pub struct InvocationResult {
    outcome: Result<Value, InvocationError>,
}

impl InvocationResult {
    pub fn ok(result: Value) -> Self {
        Self { outcome: Ok(result) }
    }

    pub fn err(error: InvocationError) -> Self {
        Self { outcome: Err(error) }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&InvocationError> {
        self.outcome.as_ref().err()
    }

    /// Shorthand for `error().map(|e| e.kind)`.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind)
    }

    pub fn into_outcome(self) -> Result<Value, InvocationError> {
        self.outcome
    }
}

impl From<Result<Value, InvocationError>> for InvocationResult {
    fn from(outcome: Result<Value, InvocationError>) -> Self {
        Self { outcome }
    }
}

#[derive(Serialize, Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<InvocationError>,
}

impl From<InvocationResult> for RawEnvelope {
    fn from(envelope: InvocationResult) -> Self {
        match envelope.outcome {
            Ok(result) => Self {
                success: true,
                result: Some(result),
                error: None,
            },
            Err(error) => Self {
                success: false,
                result: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<RawEnvelope> for InvocationResult {
    type Error = String;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        match (raw.success, raw.error) {
            // A JSON `null` result deserializes as `None`
            (true, None) => Ok(Self::ok(raw.result.unwrap_or(Value::Null))),
            (true, Some(_)) => Err("successful envelope must not carry an error".into()),
            (false, Some(error)) => Ok(Self::err(error)),
            (false, None) => Err("failed envelope must carry an error".into()),
        }
    }
}
