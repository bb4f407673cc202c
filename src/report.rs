//! Textual report rendering
//!
//! Produces the flat dump written on flush: a header with the export
//! timestamp and active configuration, the error partition with stack
//! traces, then the bounded general partition.

use chrono::{DateTime, Utc};

use crate::config::CaptureConfig;
use crate::store::{LogEntry, StoreSnapshot};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";

/// Render the export document
///
/// Everything below the header depends only on the snapshot, so repeated
/// exports over an unchanged store produce identical sections.
pub fn render_report(
    config: &CaptureConfig,
    snapshot: &StoreSnapshot,
    exported_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("==== Log Capture Report ====\n");
    out.push_str(&format!(
        "Exported: {}\n",
        exported_at.format(TIMESTAMP_FORMAT)
    ));
    out.push_str(&format!("Minimum severity: {}\n", config.minimum_severity));
    match &config.category_filter {
        Some(categories) => {
            let list: Vec<&str> = categories.iter().map(String::as_str).collect();
            out.push_str(&format!("Categories: {}\n", list.join(", ")));
        }
        None => out.push_str("Categories: All\n"),
    }
    out.push_str(&format!("General capacity: {}\n", config.general_capacity));
    out.push('\n');

    out.push_str(&format!("-- Errors ({}) --\n", snapshot.errors.len()));
    for entry in &snapshot.errors {
        push_entry(&mut out, entry);
    }
    out.push('\n');

    out.push_str(&format!(
        "-- Recent ({}/{}) --\n",
        snapshot.general.len(),
        config.general_capacity
    ));
    for entry in &snapshot.general {
        push_entry(&mut out, entry);
    }

    out
}

fn push_entry(out: &mut String, entry: &LogEntry) {
    out.push_str(&format!(
        "{} {:5} {}: {}\n",
        entry.timestamp.format(TIMESTAMP_FORMAT),
        entry.severity.as_str(),
        entry.category,
        entry.message
    ));
    if let Some(trace) = &entry.stack_trace {
        for line in trace.lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }
}
