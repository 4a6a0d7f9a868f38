//! Structural builders for composite message bodies.
//!
//! The host hands nested UI collections over in loose shapes. Each builder
//! reduces one of them to the canonical array or object the gateway accepts and
//! fails with a validation error naming the missing piece.

use serde_json::{Map, Value, json};
use warest_common::WarestError;
use warest_common::helpers::{collection_entries, first_string_of, optional_string_from, sanitize};

use crate::binary::{self, BinarySource};
use crate::descriptor::Builder;

pub const MAX_BUTTONS: usize = 3;

const BUTTON_OPTIONAL: &[&str] = &["id", "type", "url", "phoneNumber", "copyCode"];

pub fn apply(
    builder: Builder,
    params: &Map<String, Value>,
    body: &mut Map<String, Value>,
    source: &dyn BinarySource,
) -> Result<(), WarestError> {
    let (field, value) = match builder {
        Builder::Buttons => ("buttons", buttons(params.get("buttons"))?),
        Builder::List => ("list", list(params.get("list"))?),
        Builder::Location => ("location", location(params)?),
        Builder::Poll => ("poll", poll(params.get("poll"))?),
        Builder::Contact => ("contact", contact(params.get("contact"))?),
        Builder::Participants => ("participants", participants(params.get("participants"))?),
        Builder::Files => ("files", files(params.get("files"), source)?),
    };
    body.insert(field.to_string(), value);
    Ok(())
}

fn buttons(raw: Option<&Value>) -> Result<Value, WarestError> {
    let mut out = Vec::new();
    for entry in raw.map_or_else(Vec::new, |v| collection_entries(v, "button")) {
        let Some(text) = first_string_of(entry, &["text", "title", "displayText"]) else {
            continue;
        };
        let mut button = Map::new();
        button.insert("text".into(), Value::String(text));
        for key in BUTTON_OPTIONAL {
            if let Some(value) = optional_string_from(entry, key) {
                button.insert((*key).to_string(), Value::String(value));
            }
        }
        out.push(Value::Object(button));
    }
    if out.is_empty() {
        return Err(WarestError::validation("at least one button with a title is required"));
    }
    if out.len() > MAX_BUTTONS {
        return Err(WarestError::validation(format!("at most {MAX_BUTTONS} buttons are allowed")));
    }
    Ok(Value::Array(out))
}

fn list(raw: Option<&Value>) -> Result<Value, WarestError> {
    let raw = raw.cloned().unwrap_or(Value::Null);
    let button_text = first_string_of(&raw, &["buttonText"])
        .ok_or_else(|| WarestError::validation("list button text is required"))?;

    let mut sections = Vec::new();
    for section in raw
        .get("sections")
        .map(|v| collection_entries(v, "section"))
        .unwrap_or_default()
    {
        let rows: Vec<Value> = section
            .get("rows")
            .map(|v| collection_entries(v, "row"))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                let id = optional_string_from(row, "id")?;
                let title = optional_string_from(row, "title")?;
                let mut out = json!({"id": id, "title": title});
                if let Some(description) = optional_string_from(row, "description") {
                    out["description"] = Value::String(description);
                }
                Some(out)
            })
            .collect();
        if rows.is_empty() {
            continue;
        }
        let mut out = Map::new();
        if let Some(title) = optional_string_from(section, "title") {
            out.insert("title".into(), Value::String(title));
        }
        out.insert("rows".into(), Value::Array(rows));
        sections.push(Value::Object(out));
    }
    if sections.is_empty() {
        return Err(WarestError::validation(
            "at least one list section with a row (id and title) is required",
        ));
    }

    let mut out = Map::new();
    out.insert("buttonText".into(), Value::String(button_text));
    for key in ["title", "footer"] {
        if let Some(value) = optional_string_from(&raw, key) {
            out.insert(key.into(), Value::String(value));
        }
    }
    out.insert("sections".into(), Value::Array(sections));
    Ok(Value::Object(out))
}

fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Coordinates may sit under a `location` object or directly on the bag.
fn location(params: &Map<String, Value>) -> Result<Value, WarestError> {
    let source = match params.get("location") {
        Some(nested @ Value::Object(_)) => nested.clone(),
        _ => Value::Object(params.clone()),
    };
    let (Some(latitude), Some(longitude)) = (
        coordinate(source.get("latitude")),
        coordinate(source.get("longitude")),
    ) else {
        return Err(WarestError::validation("latitude/longitude required"));
    };
    let mut out = json!({"latitude": latitude, "longitude": longitude});
    for key in ["name", "address"] {
        if let Some(value) = optional_string_from(&source, key) {
            out[key] = Value::String(value);
        }
    }
    Ok(out)
}

fn poll(raw: Option<&Value>) -> Result<Value, WarestError> {
    let raw = raw.cloned().unwrap_or(Value::Null);
    let options: Vec<Value> = raw
        .get("options")
        .map(|v| match v {
            Value::Array(items) => items.iter().collect(),
            other => collection_entries(other, "option"),
        })
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            other => first_string_of(other, &["value", "option", "title"]),
        })
        .map(Value::String)
        .collect();
    if options.is_empty() {
        return Err(WarestError::validation("at least one poll option is required"));
    }

    let mut out = Map::new();
    if let Some(name) = first_string_of(&raw, &["name", "question"]) {
        out.insert("name".into(), Value::String(name));
    }
    out.insert("options".into(), Value::Array(options));
    let count = raw.get("selectableCount").and_then(|v| match v {
        Value::String(s) => s.trim().parse::<u64>().ok(),
        other => other.as_u64(),
    });
    if let Some(count) = count {
        out.insert("selectableCount".into(), Value::from(count));
    }
    Ok(Value::Object(out))
}

fn contact(raw: Option<&Value>) -> Result<Value, WarestError> {
    match raw.and_then(sanitize) {
        Some(value @ Value::Object(_)) => Ok(value),
        _ => Err(WarestError::validation("contact details are required")),
    }
}

fn participants(raw: Option<&Value>) -> Result<Value, WarestError> {
    let list: Vec<Value> = match raw {
        Some(Value::String(text)) => text
            .split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
        Some(other) => collection_entries(other, "participant")
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                Value::Number(n) => Some(n.to_string()),
                other => first_string_of(other, &["value", "id", "title"]),
            })
            .map(Value::String)
            .collect(),
        None => Vec::new(),
    };
    if list.is_empty() {
        return Err(WarestError::validation("at least one participant is required"));
    }
    Ok(Value::Array(list))
}

fn files(raw: Option<&Value>, source: &dyn BinarySource) -> Result<Value, WarestError> {
    let mut out = Vec::new();
    for entry in raw.map_or_else(Vec::new, |v| collection_entries(v, "file")) {
        if let Value::String(reference) = entry {
            let reference = reference.trim();
            if !reference.is_empty() {
                out.push(json!({ "file": reference }));
            }
            continue;
        }
        let from_binary = binary::binary_mode(entry)
            || entry
                .get("source")
                .and_then(Value::as_str)
                .is_some_and(|s| s.eq_ignore_ascii_case("binary"));

        let mut file = Map::new();
        let mut attachment_name = None;
        let mut attachment_mime = None;
        if from_binary {
            let attachment = binary::fetch(source, &binary::property_name(entry))?;
            let mime = optional_string_from(entry, "mimeType");
            let default_mime = mime.as_deref().unwrap_or("application/octet-stream");
            file.insert(
                "file".into(),
                Value::String(attachment.data_uri(default_mime)),
            );
            attachment_name = attachment.file_name.clone();
            attachment_mime = attachment.mime_type.clone();
        } else {
            match first_string_of(entry, &["url", "file"]) {
                Some(reference) => {
                    file.insert("file".into(), Value::String(reference));
                }
                None => continue,
            }
        }

        if let Some(name) = optional_string_from(entry, "fileName").or(attachment_name) {
            file.insert("fileName".into(), Value::String(name));
        }
        if let Some(caption) = optional_string_from(entry, "caption") {
            file.insert("caption".into(), Value::String(caption));
        }
        if let Some(mime) = optional_string_from(entry, "mimeType").or(attachment_mime) {
            file.insert("mimeType".into(), Value::String(mime));
        }
        out.push(Value::Object(file));
    }
    if out.is_empty() {
        return Err(WarestError::validation("at least one file is required"));
    }
    Ok(Value::Array(out))
}
