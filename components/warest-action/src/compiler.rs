//! Turns a `resource:operation` pair and a parameter bag into an [`OutboundRequest`].

use serde_json::{Map, Value};
use tracing::debug;
use warest_common::helpers::{present, value_to_text};
use warest_common::{Credentials, WarestError};

use crate::binary::{self, BinarySource, NoBinary};
use crate::descriptor::{FieldTarget, Method, OperationDescriptor};
use crate::request::OutboundRequest;
use crate::{builders, catalog, options, preprocess};

pub fn compile(
    resource: &str,
    operation: &str,
    params: &Map<String, Value>,
    creds: &Credentials,
) -> Result<OutboundRequest, WarestError> {
    compile_with_binary(resource, operation, params, creds, &NoBinary)
}

pub fn compile_with_binary(
    resource: &str,
    operation: &str,
    params: &Map<String, Value>,
    creds: &Credentials,
    source: &dyn BinarySource,
) -> Result<OutboundRequest, WarestError> {
    let descriptor = catalog::lookup(resource, operation)?;
    let path = substitute_path(descriptor, params)?;

    let mut query = Map::new();
    let mut body = Map::new();
    copy_fields(descriptor.query_fields, params, &mut query);
    copy_fields(descriptor.body_fields, params, &mut body);

    if let Some(strategy) = descriptor.preprocess {
        preprocess::apply(strategy, &mut query, &mut body)?;
    }

    let extra = catalog::options_layout(resource).flatten(params);
    if !extra.is_empty() {
        match descriptor.options_target() {
            FieldTarget::Query => options::merge_missing(&mut query, extra),
            FieldTarget::Body => options::merge_missing(&mut body, extra),
        }
    }

    if let Some(builder) = descriptor.builder {
        builders::apply(builder, params, &mut body, source)?;
    }

    if let Some(media) = descriptor.media {
        let (value, attachment) =
            binary::resolve_media(params, media.field, media.default_mime, source)?;
        body.insert(media.field.to_string(), value);
        if let (Some(name_field), Some(name)) = (
            media.file_name_field,
            attachment.and_then(|a| a.file_name.clone()),
        ) {
            body.entry(name_field.to_string())
                .or_insert(Value::String(name));
        }
    }

    debug!(
        key = %descriptor.key(),
        method = %descriptor.method,
        path = %path,
        query_keys = query.len(),
        body_keys = body.len(),
        "compiled warest request"
    );

    Ok(OutboundRequest {
        method: descriptor.method,
        url: creds.url_for(&path),
        query,
        body: (descriptor.method != Method::Get).then_some(body),
    })
}

fn substitute_path(
    descriptor: &OperationDescriptor,
    params: &Map<String, Value>,
) -> Result<String, WarestError> {
    let mut path = descriptor.path.to_string();
    for name in descriptor.path_params {
        let value = present(params, name)
            .map(value_to_text)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| WarestError::validation(format!("{name} is required")))?;
        let encoded = urlencoding::encode(value.trim());
        path = path.replace(&format!("{{{name}}}"), &encoded);
    }
    Ok(path)
}

fn copy_fields(fields: &[&str], params: &Map<String, Value>, target: &mut Map<String, Value>) {
    for field in fields {
        if let Some(value) = present(params, field) {
            target.insert((*field).to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryData;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn creds() -> Credentials {
        Credentials::new("https://wa.example.com/", "key")
    }

    fn bag(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn send_text_copies_body_fields() {
        let request = compile(
            "messages",
            "sendText",
            &bag(json!({"sessionId": "s1", "to": "628123", "message": "hi"})),
            &creds(),
        )
        .unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url,
            "https://wa.example.com/api/v1/messages/send/text"
        );
        assert!(request.query.is_empty());
        assert_eq!(
            request.body,
            Some(bag(json!({"sessionId": "s1", "to": "628123", "message": "hi"})))
        );
    }

    #[test]
    fn blank_fields_are_skipped() {
        let request = compile(
            "chats",
            "messages",
            &bag(json!({"chatId": "c1", "sessionId": "s1", "limit": null, "cursor": ""})),
            &creds(),
        )
        .unwrap();
        assert_eq!(request.query, bag(json!({"sessionId": "s1"})));
        assert_eq!(request.body, None);
    }

    #[test]
    fn path_params_are_encoded_and_required() {
        let request = compile(
            "groups",
            "get",
            &bag(json!({"groupId": "1203@g.us/x"})),
            &creds(),
        )
        .unwrap();
        assert_eq!(
            request.url,
            "https://wa.example.com/api/v1/groups/1203%40g.us%2Fx"
        );
        let err = compile("groups", "get", &bag(json!({"groupId": ""})), &creds()).unwrap_err();
        assert_eq!(err, WarestError::validation("groupId is required"));
    }

    #[test]
    fn additional_fields_never_override_explicit_values() {
        let request = compile(
            "messages",
            "sendText",
            &bag(json!({
                "sessionId": "s1",
                "to": "628",
                "message": "explicit",
                "additionalFields": {
                    "messageOptions": {"message": "stale", "linkPreview": true},
                    "quoted": {"quotedMessageId": ""}
                }
            })),
            &creds(),
        )
        .unwrap();
        let body = request.body.unwrap();
        assert_eq!(body["message"], json!("explicit"));
        assert_eq!(body["linkPreview"], json!(true));
        assert!(!body.contains_key("quotedMessageId"));
    }

    #[test]
    fn get_options_land_in_query() {
        let request = compile(
            "chats",
            "list",
            &bag(json!({"sessionId": "s1", "chatOptions": {"pagination": {"limit": 20}}})),
            &creds(),
        )
        .unwrap();
        assert_eq!(request.query, bag(json!({"sessionId": "s1", "limit": 20})));
    }

    #[test]
    fn explicit_target_routes_options_to_body() {
        let request = compile(
            "profile",
            "updatePrivacy",
            &bag(json!({
                "sessionId": "s1",
                "profileOptions": {"privacy": {"lastSeen": "contacts"}}
            })),
            &creds(),
        )
        .unwrap();
        assert_eq!(
            request.body,
            Some(bag(json!({"sessionId": "s1", "lastSeen": "contacts"})))
        );
    }

    #[test]
    fn send_button_without_buttons_fails() {
        let err = compile(
            "messages",
            "sendButton",
            &bag(json!({"sessionId": "s1", "to": "628", "message": "pick"})),
            &creds(),
        )
        .unwrap_err();
        assert!(matches!(err, WarestError::Validation(ref msg) if msg.contains("button")));
    }

    #[test]
    fn decrypt_media_renames_output() {
        let request = compile(
            "misc",
            "decryptMedia",
            &bag(json!({
                "sessionId": "s1",
                "url": "u",
                "mediaKey": "k",
                "mediaType": "image",
                "outputFormat": "Buffer"
            })),
            &creds(),
        )
        .unwrap();
        let body = request.body.unwrap();
        assert_eq!(body["output"], json!("buffer"));
        assert!(!body.contains_key("outputFormat"));
    }

    #[test]
    fn binary_document_fills_file_name() {
        let mut store = BTreeMap::new();
        store.insert(
            "data".to_string(),
            BinaryData::new("application/pdf", b"%PDF".to_vec()).with_file_name("report.pdf"),
        );
        let request = compile_with_binary(
            "messages",
            "sendDocument",
            &bag(json!({"sessionId": "s1", "to": "628", "inputType": "binary"})),
            &creds(),
            &store,
        )
        .unwrap();
        let body = request.body.unwrap();
        assert_eq!(
            body["document"],
            json!("data:application/pdf;base64,JVBERg==")
        );
        assert_eq!(body["fileName"], json!("report.pdf"));
    }

    #[test]
    fn media_url_passes_through() {
        let request = compile(
            "messages",
            "sendImage",
            &bag(json!({
                "sessionId": "s1",
                "to": "628",
                "image": "https://cdn/x.jpg",
                "caption": ""
            })),
            &creds(),
        )
        .unwrap();
        assert_eq!(
            request.body,
            Some(bag(json!({"sessionId": "s1", "to": "628", "image": "https://cdn/x.jpg"})))
        );
    }

    #[test]
    fn delete_keeps_empty_body() {
        let request = compile(
            "session",
            "delete",
            &bag(json!({"sessionId": "s1"})),
            &creds(),
        )
        .unwrap();
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.url, "https://wa.example.com/api/v1/session/s1");
        assert_eq!(request.body, Some(Map::new()));
    }

    #[test]
    fn unknown_pair_is_unsupported() {
        let err = compile("server", "reboot", &Map::new(), &creds()).unwrap_err();
        assert_eq!(err, WarestError::unsupported("server", "reboot"));
    }
}
