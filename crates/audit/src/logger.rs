//! Audit logging: the append-only record of every capability invocation.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use taskrelay_core::error::AuditError;
use taskrelay_core::invocation::ToolCallRecord;
use tracing::error;

/// Trait for audit log sinks (where records are written).
pub trait AuditSink: Send + Sync {
    /// Sink name, for diagnostics.
    fn name(&self) -> &str;

    fn record(&self, record: &ToolCallRecord) -> Result<(), AuditError>;
}

/// Filter for [`AuditLogger::query`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
    pub caller_id: Option<String>,
    pub capability: Option<String>,
    /// Inclusive lower bound
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub until: Option<DateTime<Utc>>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn caller(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    pub fn capability(mut self, name: impl Into<String>) -> Self {
        self.capability = Some(name.into());
        self
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    pub fn matches(&self, record: &ToolCallRecord) -> bool {
        self.caller_id.as_ref().is_none_or(|c| &record.caller_id == c)
            && self.capability.as_ref().is_none_or(|c| &record.capability == c)
            && self.since.is_none_or(|t| record.timestamp >= t)
            && self.until.is_none_or(|t| record.timestamp < t)
    }
}

/// In-memory audit log that keeps records ordered by timestamp and fans
/// each one out to its sinks.
pub struct AuditLogger {
    records: Mutex<Vec<Arc<ToolCallRecord>>>,
    sinks: Vec<Box<dyn AuditSink>>,
    sink_failures: AtomicU64,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("record_count", &self.count())
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    /// Create a new audit logger with no sinks.
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    /// Create a new audit logger with the given sinks.
    pub fn with_sinks(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            sinks,
            sink_failures: AtomicU64::new(0),
        }
    }

    /// Append a record.
    ///
    /// The record is stored before this returns. A failing sink is logged
    /// and counted but never surfaces to the caller.
    pub fn append(&self, record: ToolCallRecord) {
        let record = Arc::new(record);

        {
            let mut records = self.lock();
            // Equal timestamps keep arrival order
            let at = records.partition_point(|r| r.timestamp <= record.timestamp);
            records.insert(at, Arc::clone(&record));
        }

        for sink in &self.sinks {
            if let Err(e) = sink.record(&record) {
                self.sink_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    sink = sink.name(),
                    capability = %record.capability,
                    caller_id = %record.caller_id,
                    error = %e,
                    "Audit sink write failed"
                );
            }
        }
    }

    /// Records matching `query`, oldest first.
    ///
    /// The iterator runs over a snapshot taken now; records appended later
    /// are not observed. Call again to restart.
    pub fn query(&self, query: &AuditQuery) -> AuditRecords {
        let records = self.lock();
        let start = match query.since {
            Some(since) => records.partition_point(|r| r.timestamp < since),
            None => 0,
        };
        AuditRecords {
            snapshot: records[start..].to_vec().into_iter(),
            query: query.clone(),
        }
    }

    /// Get all recorded entries.
    pub fn entries(&self) -> Vec<ToolCallRecord> {
        self.query(&AuditQuery::default()).collect()
    }

    /// Count of stored records.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Number of sink writes that failed since startup.
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<ToolCallRecord>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lazy iterator returned by [`AuditLogger::query`].
pub struct AuditRecords {
    snapshot: std::vec::IntoIter<Arc<ToolCallRecord>>,
    query: AuditQuery,
}

impl Iterator for AuditRecords {
    type Item = ToolCallRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.snapshot.by_ref() {
            if self.query.until.is_some_and(|until| record.timestamp >= until) {
                // Sorted ascending: nothing later can match
                return None;
            }
            if self.query.matches(&record) {
                return Some(ToolCallRecord::clone(&record));
            }
        }
        None
    }
}

/// A tracing-based audit sink that logs records via `tracing::info!`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn record(&self, record: &ToolCallRecord) -> Result<(), AuditError> {
        tracing::info!(
            capability = %record.capability,
            caller_id = %record.caller_id,
            success = record.result.is_success(),
            error_kind = ?record.result.error_kind(),
            duration_ms = record.duration_ms,
            "AUDIT"
        );
        Ok(())
    }
}
