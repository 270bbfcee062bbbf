//! Per-family default feature tables.

use std::collections::BTreeMap;

/// Hash of permission to enabled state.
pub type FeatureFlags = BTreeMap<String, bool>;

fn flags(entries: &[(&str, bool)]) -> FeatureFlags {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

pub fn site_default_features() -> FeatureFlags {
    flags(&[
        ("hub:site:events", true),
        ("hub:site:content", true),
        ("hub:site:discussions", true),
    ])
}

pub fn project_default_features() -> FeatureFlags {
    flags(&[
        ("hub:project:events", false),
        ("hub:project:content", true),
        ("hub:project:discussions", false),
    ])
}

pub fn initiative_default_features() -> FeatureFlags {
    flags(&[
        ("hub:initiative:events", false),
        ("hub:initiative:content", true),
        ("hub:initiative:discussions", false),
    ])
}

pub fn group_default_features() -> FeatureFlags {
    flags(&[("hub:group:discussions", true)])
}

/// Merge entity overrides onto family defaults. Only keys present in the
/// defaults are considered; overrides win.
pub fn process_entity_features(
    overrides: Option<&serde_json::Value>,
    defaults: &FeatureFlags,
) -> FeatureFlags {
    defaults
        .iter()
        .map(|(key, default)| {
            let value = overrides
                .and_then(|o| o.get(key))
                .and_then(|v| v.as_bool())
                .unwrap_or(*default);
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overrides_win() {
        let overrides = json!({"hub:initiative:events": true, "hub:other": false});
        let features = process_entity_features(Some(&overrides), &initiative_default_features());
        assert_eq!(features.get("hub:initiative:events"), Some(&true));
        assert_eq!(features.get("hub:initiative:content"), Some(&true));
        assert_eq!(features.get("hub:initiative:discussions"), Some(&false));
        assert!(!features.contains_key("hub:other"));
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        assert_eq!(
            process_entity_features(None, &project_default_features()),
            project_default_features()
        );
    }
}
