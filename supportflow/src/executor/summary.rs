//! Bounded result summaries for `ability_end` events.

use serde_json::{json, Map, Value};

/// Default number of result entries kept in a summary.
pub const DEFAULT_SUMMARY_CAP: usize = 8;

/// Key under which non-object results are stored: `<stage>_<ability>`.
#[must_use]
pub fn synthesized_key(stage: &str, ability: &str) -> String {
    format!("{stage}_{ability}")
}

/// Summarizes an ability result for tracing.
///
/// Primitive values are kept verbatim, nested values are replaced by a
/// marker, and at most `cap` entries are kept. Dropped entries are counted
/// under `truncated_keys`.
#[must_use]
pub fn summarize_result(stage: &str, ability: &str, result: &Value, cap: usize) -> Value {
    let entries: Vec<(&str, &Value)> = match result {
        Value::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        other => {
            let key = synthesized_key(stage, ability);
            let mut summary = Map::new();
            if cap > 0 {
                summary.insert(key, brief(other));
            } else {
                summary.insert("truncated_keys".to_string(), json!(1));
            }
            return Value::Object(summary);
        }
    };

    let mut summary: Map<String, Value> = entries
        .iter()
        .take(cap)
        .map(|(key, value)| ((*key).to_string(), brief(value)))
        .collect();

    if entries.len() > cap {
        summary.insert("truncated_keys".to_string(), json!(entries.len() - cap));
    }
    Value::Object(summary)
}

fn brief(value: &Value) -> Value {
    match value {
        Value::Object(_) => json!("<object>"),
        Value::Array(_) => json!("<array>"),
        primitive => primitive.clone(),
    }
}
