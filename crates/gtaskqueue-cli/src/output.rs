//! JSON printing and payload elision.

use anyhow::anyhow;
use gtaskqueue_api::json::to_sorted_pretty;
use serde::Serialize;
use serde_json::Value;

use crate::client::{CliError, CliResult};

/// Convert a response into a JSON value.
pub(crate) fn to_json<T: Serialize>(value: &T) -> CliResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| CliError::failure(anyhow!("failed to encode response: {err}")))
}

/// Sorted-key, two-space-indented rendering of `value`.
pub(crate) fn format_json(value: Value) -> CliResult<String> {
    to_sorted_pretty(value).map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn print_json(value: Value) -> CliResult<()> {
    let text = format_json(value)?;
    println!("{text}");
    Ok(())
}

/// Shorten `payload` to `limit` bytes followed by `(N more bytes)`.
///
/// Returns `None` when the payload already fits. N is always `len - limit`.
/// A character straddling the cut is left out of the shown prefix, so the
/// prefix never exceeds `limit` bytes.
#[must_use]
pub(crate) fn truncate_payload(payload: &str, limit: usize) -> Option<String> {
    if payload.len() <= limit {
        return None;
    }
    let prefix = match std::str::from_utf8(&payload.as_bytes()[..limit]) {
        Ok(prefix) => prefix,
        Err(err) => &payload[..err.valid_up_to()],
    };
    let extra = payload.len() - limit;
    Some(format!("{prefix}({extra} more bytes)"))
}

/// Apply [`truncate_payload`] to `tasks[*].pullMessage.payload`.
#[must_use]
pub(crate) fn elide_payloads(mut result: Value, limit: usize) -> Value {
    let Some(tasks) = result.get_mut("tasks").and_then(Value::as_array_mut) else {
        return result;
    };
    for task in tasks {
        let Some(payload) = task.pointer_mut("/pullMessage/payload") else {
            continue;
        };
        if let Some(shortened) = payload.as_str().and_then(|text| truncate_payload(text, limit)) {
            *payload = Value::String(shortened);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_within_limit_is_untouched() {
        assert_eq!(truncate_payload("abcd", 4), None);
        assert_eq!(truncate_payload("", 0), None);
    }

    #[test]
    fn payload_over_limit_reports_remaining_bytes() {
        assert_eq!(
            truncate_payload("0123456789", 4).as_deref(),
            Some("0123(6 more bytes)")
        );
    }

    #[test]
    fn truncated_length_is_bounded() {
        let payload = "x".repeat(1_000);
        for limit in [0_usize, 1, 10, 999] {
            let shortened = truncate_payload(&payload, limit).expect("over limit");
            let suffix = format!("({} more bytes)", 1_000 - limit);
            assert!(shortened.ends_with(&suffix));
            assert_eq!(shortened.len(), limit + suffix.len());
        }
    }

    #[test]
    fn multibyte_cut_still_counts_dropped_bytes() {
        let shortened = truncate_payload("héllo", 2).expect("over limit");
        assert_eq!(shortened, "h(4 more bytes)");

        let shortened = truncate_payload("héllo", 3).expect("over limit");
        assert_eq!(shortened, "hé(3 more bytes)");
    }

    #[test]
    fn elide_payloads_rewrites_only_large_payloads() {
        let result = json!({
            "tasks": [
                {"name": "a", "pullMessage": {"payload": "0123456789", "tag": "t"}},
                {"name": "b", "pullMessage": {"payload": "01"}},
                {"name": "c"}
            ]
        });

        let elided = elide_payloads(result, 4);
        assert_eq!(
            elided,
            json!({
                "tasks": [
                    {"name": "a", "pullMessage": {"payload": "0123(6 more bytes)", "tag": "t"}},
                    {"name": "b", "pullMessage": {"payload": "01"}},
                    {"name": "c"}
                ]
            })
        );
    }

    #[test]
    fn elide_payloads_ignores_results_without_tasks() {
        assert_eq!(elide_payloads(json!({}), 1), json!({}));
    }

    #[test]
    fn format_json_sorts_keys() {
        let text = format_json(json!({"deleted": 3, "a": true})).expect("formats");
        assert_eq!(text, "{\n  \"a\": true,\n  \"deleted\": 3\n}");
    }
}
