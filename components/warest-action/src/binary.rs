//! Binary attachments and data URI synthesis.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use warest_common::WarestError;
use warest_common::helpers::{flag, optional_string_from, present};

pub const DEFAULT_BINARY_PROPERTY: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryData {
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

impl BinaryData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            file_name: None,
            data: data.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn data_uri(&self, default_mime: &str) -> String {
        let mime = self
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default_mime);
        format!("data:{mime};base64,{}", STANDARD.encode(&self.data))
    }
}

/// Host item storage for binary attachments, keyed by property name.
pub trait BinarySource {
    fn binary(&self, property: &str) -> Option<&BinaryData>;
}

impl BinarySource for BTreeMap<String, BinaryData> {
    fn binary(&self, property: &str) -> Option<&BinaryData> {
        self.get(property)
    }
}

/// A source with no attachments.
pub struct NoBinary;

impl BinarySource for NoBinary {
    fn binary(&self, _property: &str) -> Option<&BinaryData> {
        None
    }
}

/// Binary mode is selected with `binaryMode: true` or `inputType: "binary"`.
pub fn binary_mode(entry: &Value) -> bool {
    flag(entry.get("binaryMode"))
        || entry
            .get("inputType")
            .and_then(Value::as_str)
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("binary"))
}

pub fn property_name(entry: &Value) -> String {
    optional_string_from(entry, "binaryPropertyName")
        .unwrap_or_else(|| DEFAULT_BINARY_PROPERTY.to_string())
}

pub fn fetch<'a>(
    source: &'a dyn BinarySource,
    property: &str,
) -> Result<&'a BinaryData, WarestError> {
    source.binary(property).ok_or_else(|| {
        WarestError::validation(format!("no binary data found under property \"{property}\""))
    })
}

/// Resolve a media field to the string the gateway expects.
///
/// Returns the data URI plus the attachment when binary mode was used so the
/// caller can fill a file name.
pub fn resolve_media<'a>(
    params: &Map<String, Value>,
    field: &str,
    default_mime: &str,
    source: &'a dyn BinarySource,
) -> Result<(Value, Option<&'a BinaryData>), WarestError> {
    let bag = Value::Object(params.clone());
    if binary_mode(&bag) {
        let attachment = fetch(source, &property_name(&bag))?;
        let uri = Value::String(attachment.data_uri(default_mime));
        return Ok((uri, Some(attachment)));
    }
    match present(params, field) {
        Some(value) => Ok((value.clone(), None)),
        None => {
            Err(WarestError::validation(format!("{field} is required (URL, path or data URI)")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> BTreeMap<String, BinaryData> {
        let mut store = BTreeMap::new();
        store.insert(
            "data".to_string(),
            BinaryData::new("image/png", b"hi".to_vec()).with_file_name("a.png"),
        );
        store.insert(
            "raw".to_string(),
            BinaryData {
                mime_type: None,
                file_name: None,
                data: vec![0xff],
            },
        );
        store
    }

    #[test]
    fn data_uri_uses_attachment_mime() {
        let store = store();
        let uri = store.binary("data").unwrap().data_uri("image/jpeg");
        assert_eq!(uri, "data:image/png;base64,aGk=");
        let uri = store.binary("raw").unwrap().data_uri("image/jpeg");
        assert_eq!(uri, "data:image/jpeg;base64,/w==");
    }

    #[test]
    fn binary_mode_flags() {
        assert!(binary_mode(&json!({"binaryMode": true})));
        assert!(binary_mode(&json!({"inputType": "Binary"})));
        assert!(!binary_mode(&json!({"inputType": "url"})));
        assert_eq!(property_name(&json!({})), "data");
        assert_eq!(property_name(&json!({"binaryPropertyName": "raw"})), "raw");
    }

    #[test]
    fn resolve_prefers_binary_when_selected() {
        let store = store();
        let params = json!({"binaryMode": true, "image": "https://ignored"});
        let (value, attachment) =
            resolve_media(params.as_object().unwrap(), "image", "image/jpeg", &store).unwrap();
        assert_eq!(value, json!("data:image/png;base64,aGk="));
        assert_eq!(attachment.unwrap().file_name.as_deref(), Some("a.png"));
    }

    #[test]
    fn resolve_requires_string_or_attachment() {
        let params = json!({"image": ""});
        let err = resolve_media(
            params.as_object().unwrap(),
            "image",
            "image/jpeg",
            &NoBinary,
        )
        .unwrap_err();
        assert!(err.to_string().contains("image is required"));

        let params = json!({"inputType": "binary", "binaryPropertyName": "missing"});
        let err = resolve_media(
            params.as_object().unwrap(),
            "image",
            "image/jpeg",
            &NoBinary,
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"missing\""));
    }
}
