//! Event tag collection
//!
//! Turns the `event_tags_json` macro value into flat `tag` / `tag:value`
//! labels. Tagging is best-effort: malformed input is logged and yields no
//! labels instead of failing the notification.

use serde_json::Value;
use tracing::debug;

/// Value left behind when the macro was not expanded
pub const UNEXPANDED_TAGS_MACRO: &str = "{EVENT.TAGSJSON}";

/// Collect labels in input order, dropping repeats
pub fn collect(raw: Option<&str>) -> Vec<String> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() && r != UNEXPANDED_TAGS_MACRO => r,
        _ => return Vec::new(),
    };

    let entries: Vec<Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(error = %e, "Failed to parse \"event_tags_json\" param");
            return Vec::new();
        }
    };

    let mut labels = Vec::with_capacity(entries.len());
    for entry in entries {
        let tag = match entry.get("tag") {
            Some(Value::String(tag)) => tag,
            _ => continue,
        };

        let label = match entry.get("value") {
            Some(Value::String(v)) if !v.is_empty() => format!("{}:{}", tag, v),
            Some(Value::Null) | Some(Value::String(_)) | None => tag.clone(),
            Some(other) => format!("{}:{}", tag, other),
        };

        push_unique(&mut labels, normalize(&label));
    }

    labels
}

/// Append `label` unless it is already present
pub fn push_unique(labels: &mut Vec<String>, label: String) {
    if !labels.contains(&label) {
        labels.push(label);
    }
}

fn normalize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
