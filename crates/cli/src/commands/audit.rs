//! `taskrelay audit`: Read back recorded invocations.

use chrono::{DateTime, Utc};
use taskrelay_audit::{AuditQuery, JsonlSink};
use taskrelay_config::AppConfig;
use taskrelay_core::invocation::ToolCallRecord;

fn build_query(
    user: Option<String>,
    capability: Option<String>,
    since: Option<String>,
) -> Result<AuditQuery, Box<dyn std::error::Error>> {
    let mut query = AuditQuery::new();
    if let Some(user) = user {
        query = query.caller(user);
    }
    if let Some(capability) = capability {
        query = query.capability(capability);
    }
    if let Some(since) = since {
        let at = DateTime::parse_from_rfc3339(&since)
            .map_err(|e| format!("--since must be an RFC 3339 timestamp: {e}"))?;
        query = query.since(at.with_timezone(&Utc));
    }
    Ok(query)
}

fn summary_line(record: &ToolCallRecord) -> String {
    let outcome = match record.result.error() {
        None => "ok".to_string(),
        Some(error) => format!("{}: {}", error.kind.as_str(), error.message),
    };
    format!(
        "{}  {:<10} {:<18} {:>6}ms  {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.caller_id,
        record.capability,
        record.duration_ms,
        outcome
    )
}

/// Oldest first. Concurrent appends can land out of timestamp order.
fn ordered(records: impl IntoIterator<Item = ToolCallRecord>) -> Vec<ToolCallRecord> {
    let mut records: Vec<ToolCallRecord> = records.into_iter().collect();
    records.sort_by_key(|r| r.timestamp);
    records
}

pub async fn run(
    config: AppConfig,
    user: Option<String>,
    capability: Option<String>,
    since: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = build_query(user, capability, since)?;
    let path = config.audit.resolved_jsonl_path();

    let records = ordered(JsonlSink::read(&path, &query)?);
    for record in &records {
        if as_json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", summary_line(record));
        }
    }

    if !as_json {
        eprintln!("📜 {} record(s) from {}", records.len(), path.display());
    }
    Ok(())
}
