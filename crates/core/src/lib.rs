//! # taskrelay core
//!
//! Domain types, traits, and error definitions for the taskrelay capability
//! dispatcher. Every other crate depends inward on this one.
//!
//! ## Layout
//!
//! - [`capability`] / [`registry`]: what can be invoked
//! - [`envelope`] / [`invocation`]: the uniform result shape and audit records
//! - [`classifier`]: the pluggable instruction → plan strategy
//! - [`store`]: the persistence seam the task capabilities sit on

pub mod capability;
pub mod classifier;
pub mod envelope;
pub mod error;
pub mod event;
pub mod invocation;
pub mod message;
pub mod registry;
pub mod schema;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use capability::{Capability, CapabilityDescriptor, Handler, HandlerResult, Parameters};
pub use classifier::{ClassificationPlan, IntentClassifier};
pub use envelope::{ErrorKind, InvocationError, InvocationResult};
pub use error::{AuditError, CapabilityError, Error, Result, StoreError};
pub use event::{DomainEvent, EventBus};
pub use invocation::{InvocationRequest, ToolCallRecord};
pub use message::{ConversationTurn, Role};
pub use registry::{CapabilityRegistry, RegistryBuilder};
pub use schema::{FieldKind, FieldSpec, ParameterSchema};
pub use store::{NewTask, Task, TaskFilter, TaskPatch, TaskStore};
