use serde_json::{Map, Value};
use warest_common::WarestError;
use warest_common::helpers::value_to_text;

use crate::descriptor::Preprocess;

pub const DEFAULT_DECRYPT_OUTPUT: &str = "base64";

/// Run an operation's normalization step over the copied query and body maps.
pub fn apply(
    strategy: Preprocess,
    _query: &mut Map<String, Value>,
    body: &mut Map<String, Value>,
) -> Result<(), WarestError> {
    match strategy {
        Preprocess::DecryptMediaOutput => {
            let output = body
                .remove("outputFormat")
                .map(|v| value_to_text(&v).trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DECRYPT_OUTPUT.to_string());
            body.insert("output".into(), Value::String(output));
        }
        Preprocess::PhoneList => {
            if let Some(phones) = body.get("phones") {
                let list = split_phones(phones);
                if list.is_empty() {
                    return Err(WarestError::validation("at least one phone number is required"));
                }
                body.insert(
                    "phones".into(),
                    Value::Array(list.into_iter().map(Value::String).collect()),
                );
            }
        }
        Preprocess::JsonObject(field) => {
            if let Some(Value::String(text)) = body.get(field) {
                let parsed: Value = serde_json::from_str(text).map_err(|e| {
                    WarestError::validation(format!("{field} must be valid JSON: {e}"))
                })?;
                if !parsed.is_object() {
                    return Err(WarestError::validation(format!("{field} must be a JSON object")));
                }
                body.insert(field.to_string(), parsed);
            }
        }
    }
    Ok(())
}

fn split_phones(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        other => value_to_text(other)
            .split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
