//! Small helpers for walking untyped platform JSON.

use serde_json::Value;

/// Resolve a dotted path (`"data.values.pages"`) inside a JSON value.
pub fn get_prop<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Resolve a dotted path to a string.
pub fn get_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    get_prop(value, path).and_then(|v| v.as_str())
}

/// Resolve a dotted path to a bool, treating anything missing as `false`.
pub fn get_bool(value: &Value, path: &str) -> bool {
    get_prop(value, path)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Convert epoch milliseconds into a UTC timestamp.
pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Check for a 32 character hex id (Portal item/group ids).
pub fn is_guid(value: &str) -> bool {
    value.len() == 32 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_prop_paths() {
        let doc = json!({"data": {"values": {"pages": [{"id": "p1"}]}}});
        assert_eq!(get_str(&doc, "data.values.pages.0.id"), Some("p1"));
        assert!(get_prop(&doc, "data.missing").is_none());
        assert_eq!(get_prop(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_is_guid() {
        assert!(is_guid("7deb8b7bdb4f4fab973513ebb55cd9a6"));
        assert!(!is_guid("my-slug"));
    }
}
