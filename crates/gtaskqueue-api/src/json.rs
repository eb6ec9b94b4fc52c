//! Deterministic JSON rendering.

use serde_json::{Map, Value};

/// Rebuild `value` with every object's keys in lexicographic order.
///
/// Insertion order is what `serde_json` preserves when its `preserve_order`
/// feature is active anywhere in the build graph, so ordering is enforced here
/// rather than assumed.
#[must_use]
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|left, right| left.0.cmp(&right.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Render `value` as sorted-key JSON indented by two spaces.
///
/// # Errors
///
/// Returns the serializer error if rendering fails.
pub fn to_sorted_pretty(value: Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&sort_keys(value))
}
