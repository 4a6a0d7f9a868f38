//! Shared utility functions for parameter bags and JSON payloads.

use serde::Serialize;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// JSON serialization
// ---------------------------------------------------------------------------

/// Serialize a value to JSON bytes, returning `{}` on failure.
pub fn json_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec())
}

// ---------------------------------------------------------------------------
// Presence rules
// ---------------------------------------------------------------------------

/// `null` and `""` count as absent. Whitespace-only strings are kept as given.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `params[key]` when present and not blank.
pub fn present<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    params.get(key).filter(|value| !is_blank(value))
}

/// Render a scalar as text. Objects and arrays are JSON-encoded.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Extract an optional non-empty trimmed string from `value[key]`.
pub fn optional_string_from(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First of `keys` that yields a non-empty string.
pub fn first_string_of(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| optional_string_from(value, key))
}

/// Interpret a flag that may arrive as a bool or as `"true"`/`"false"`.
pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Sanitizing nested bags
// ---------------------------------------------------------------------------

/// Recursively drop blank entries. Objects and arrays that end up empty are
/// dropped too, so the result is `None` when nothing meaningful remains.
pub fn sanitize(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let cleaned = sanitize_map(map);
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items.iter().filter_map(sanitize).collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Array(cleaned))
            }
        }
        other if is_blank(other) => None,
        other => Some(other.clone()),
    }
}

pub fn sanitize_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter_map(|(key, value)| sanitize(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Entries of a repeatable UI collection.
///
/// The host delivers these either as a bare array or wrapped in a
/// fixed-collection object such as `{"button": [...]}`. A single object under
/// the group name is treated as a one-element list.
pub fn collection_entries<'a>(value: &'a Value, group: &str) -> Vec<&'a Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get(group) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
