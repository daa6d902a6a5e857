//! Error types for the taskrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; none of them ever crosses
//! the executor boundary raw. The executor folds them into an
//! [`ErrorKind`](crate::envelope::ErrorKind) carried inside the envelope.

use std::collections::BTreeMap;
use thiserror::Error;

/// The top-level error type for taskrelay operations outside the envelope.
#[derive(Debug, Error)]
pub enum Error {
    // --- Capability errors ---
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures a capability handler reports back to the executor.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    InvalidParameters {
        message: String,
        details: BTreeMap<String, String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ExecutionFailed(String),
}

impl CapabilityError {
    /// A validation failure on a single field.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert(field.into(), reason.into());
        Self::InvalidParameters {
            message: "Invalid parameters provided".into(),
            details,
        }
    }
}

impl From<StoreError> for CapabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Unauthorized { .. } => Self::Unauthorized(err.to_string()),
            StoreError::Validation { field, reason } => Self::invalid_field(field, reason),
            StoreError::Storage(reason) => Self::ExecutionFailed(reason),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: String },

    #[error("User {user_id} does not have permission to access resource {id}")]
    Unauthorized { user_id: String, id: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "task".into(),
            id: id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write audit record to {sink}: {reason}")]
    WriteFailed { sink: String, reason: String },

    #[error("Failed to read audit log: {0}")]
    ReadFailed(String),

    #[error("Failed to serialize audit record: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_capability_not_found() {
        let err: CapabilityError = StoreError::task_not_found("abc").into();
        assert!(matches!(err, CapabilityError::NotFound(_)));
        assert_eq!(err.to_string(), "task with id abc not found");
    }

    #[test]
    fn store_validation_keeps_field_detail() {
        let err: CapabilityError = StoreError::validation("title", "Title is required").into();
        match err {
            CapabilityError::InvalidParameters { details, .. } => {
                assert_eq!(details.get("title").map(String::as_str), Some("Title is required"));
            }
            other => panic!("Expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn unauthorized_displays_user_and_resource() {
        let err = Error::Store(StoreError::Unauthorized {
            user_id: "alice".into(),
            id: "t-1".into(),
        });
        assert!(err.to_string().contains("alice"));
        assert!(err.to_string().contains("t-1"));
    }
}
