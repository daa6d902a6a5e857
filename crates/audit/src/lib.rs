//! Audit trail for capability invocations.
//!
//! [`AuditLogger`] holds every [`ToolCallRecord`](taskrelay_core::ToolCallRecord)
//! in timestamp order and forwards each one to its sinks:
//! - [`TracingSink`]: emits an `AUDIT` event through `tracing`
//! - [`JsonlSink`]: appends JSON lines to a file that `taskrelay audit` reads back

pub mod jsonl;
pub mod logger;

pub use jsonl::{JsonlRecords, JsonlSink};
pub use logger::{AuditLogger, AuditQuery, AuditRecords, AuditSink, TracingSink};
