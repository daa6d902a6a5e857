//! JSON-lines audit sink. One record per line, appended.

use crate::logger::{AuditQuery, AuditSink};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use taskrelay_core::error::AuditError;
use taskrelay_core::invocation::ToolCallRecord;
use tracing::warn;

/// Appends each record to a file as a single JSON line.
pub struct JsonlSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlSink {
    /// Create a sink writing to `path`. Parent directories are created on
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read records back from a JSONL audit file, filtered by `query`.
    ///
    /// Lines are decoded on demand. Lines that fail to decode are skipped
    /// with a warning. A missing file yields no records. Records come back in
    /// append order. Concurrent writers can interleave, so this is not
    /// strictly timestamp order.
    pub fn read(path: &Path, query: &AuditQuery) -> Result<JsonlRecords, AuditError> {
        let lines = match File::open(path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(AuditError::ReadFailed(format!("{}: {e}", path.display())));
            }
        };
        Ok(JsonlRecords {
            lines,
            query: query.clone(),
            line_no: 0,
        })
    }

    fn write_failed(&self, reason: impl std::fmt::Display) -> AuditError {
        AuditError::WriteFailed {
            sink: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl AuditSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn record(&self, record: &ToolCallRecord) -> Result<(), AuditError> {
        let line =
            serde_json::to_string(record).map_err(|e| AuditError::Serialization(e.to_string()))?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.write_failed(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_failed(e))?;
        writeln!(file, "{line}").map_err(|e| self.write_failed(e))
    }
}

/// Lazy iterator over a JSONL audit file.
pub struct JsonlRecords {
    lines: Option<Lines<BufReader<File>>>,
    query: AuditQuery,
    line_no: usize,
}

impl Iterator for JsonlRecords {
    type Item = ToolCallRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;
        for line in lines.by_ref() {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "Stopping audit read on I/O error");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ToolCallRecord>(&line) {
                Ok(record) if self.query.matches(&record) => return Some(record),
                Ok(_) => {}
                Err(e) => warn!(line = self.line_no, error = %e, "Skipping corrupt audit line"),
            }
        }
        None
    }
}
