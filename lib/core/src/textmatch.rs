// AND/OR grouped substring matching for text fields
use serde_json::Value;

/// Flatten a raw query value to its text form; lists collapse to `/`-joined
/// OR semantics.
pub fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Evaluate grouped substring logic against a target text.
///
/// `/` separates OR groups; within a group `+`, `,` and the full-width
/// `，` / `、` separate AND conditions. Matching is case-insensitive
/// substring containment. An empty query constrains nothing.
pub fn matches(target: &str, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let target = target.to_lowercase();
    let query = query.to_lowercase();
    for group in query.split('/') {
        if group
            .split(['+', ',', '，', '、'])
            .map(str::trim)
            .filter(|cond| !cond.is_empty())
            .all(|cond| target.contains(cond))
        {
            return true;
        }
    }
    false
}

/// Convenience wrapper taking the raw query value.
pub fn matches_value(target: &str, query: &Value) -> bool {
    matches(target, &query_text(query))
}
