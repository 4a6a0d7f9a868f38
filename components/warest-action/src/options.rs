//! Free-form options bags.
//!
//! Each resource family exposes one options parameter whose value is a grouped
//! collection, e.g. `{"messageOptions": {...}, "quoted": {...}}`. The layout
//! names the parameter and the groups that get flattened; anything else in the
//! bag is kept under its own key.

use serde_json::{Map, Value};
use warest_common::helpers::{sanitize, sanitize_map};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsLayout {
    pub param: &'static str,
    pub groups: &'static [&'static str],
}

impl OptionsLayout {
    pub const fn new(param: &'static str, groups: &'static [&'static str]) -> Self {
        Self { param, groups }
    }

    /// Flatten the bag found under `self.param`.
    ///
    /// Declared groups merge in order, so a later group overrides an earlier one.
    /// Top-level entries always win over group entries. Blank values are dropped at
    /// every depth.
    pub fn flatten(&self, params: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        let Some(Value::Object(bag)) = params.get(self.param) else {
            return out;
        };

        for group in self.groups {
            match bag.get(*group) {
                Some(Value::Object(entries)) => merge_into(&mut out, &sanitize_map(entries)),
                Some(Value::Array(items)) => {
                    for item in items {
                        if let Value::Object(entries) = item {
                            merge_into(&mut out, &sanitize_map(entries));
                        }
                    }
                }
                _ => {}
            }
        }

        for (key, value) in bag {
            if self.groups.contains(&key.as_str()) {
                continue;
            }
            if let Some(clean) = sanitize(value) {
                out.insert(key.clone(), clean);
            }
        }
        out
    }
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Copy `extra` into `target` without touching keys that are already set.
pub fn merge_missing(target: &mut Map<String, Value>, extra: Map<String, Value>) {
    for (key, value) in extra {
        target.entry(key).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MESSAGES: OptionsLayout = OptionsLayout::new(
        "additionalFields",
        &["messageOptions", "quoted", "mentions"],
    );

    fn bag(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn flattens_declared_groups_in_order() {
        let params = bag(json!({
            "additionalFields": {
                "messageOptions": {"linkPreview": true, "quotedId": "a"},
                "quoted": {"quotedId": "b", "empty": ""}
            }
        }));
        let flat = MESSAGES.flatten(&params);
        assert_eq!(flat, bag(json!({"linkPreview": true, "quotedId": "b"})));
    }

    #[test]
    fn keeps_top_level_scalars_and_unknown_nested_values() {
        let params = bag(json!({
            "additionalFields": {
                "delayMs": 500,
                "blank": null,
                "meta": {"a": "", "b": "x"},
                "mentions": [{"mentions": "628"}, {"extra": ""}]
            }
        }));
        let flat = MESSAGES.flatten(&params);
        assert_eq!(
            flat,
            bag(json!({"delayMs": 500, "meta": {"b": "x"}, "mentions": "628"}))
        );
    }

    #[test]
    fn top_level_entry_beats_group_entry() {
        let layout = OptionsLayout::new("chatOptions", &["pagination"]);
        let params = bag(json!({
            "chatOptions": {"pagination": {"limit": 10}, "limit": 20}
        }));
        assert_eq!(layout.flatten(&params), bag(json!({"limit": 20})));
    }

    #[test]
    fn missing_or_scalar_bag_is_empty() {
        assert!(MESSAGES.flatten(&Map::new()).is_empty());
        let scalar = bag(json!({"additionalFields": "x"}));
        assert!(MESSAGES.flatten(&scalar).is_empty());
    }

    #[test]
    fn merge_missing_keeps_explicit_values() {
        let mut target = bag(json!({"message": "explicit"}));
        merge_missing(&mut target, bag(json!({"message": "stale", "footer": "f"})));
        assert_eq!(target, bag(json!({"message": "explicit", "footer": "f"})));
    }
}
