//! The inbound webhook contract as a pure function of request and clock.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use warest_common::helpers::optional_string_from;
use warest_common::{HeaderList, WarestError};

use crate::config::TriggerConfig;
use crate::events::{self, PREFLIGHT};
use crate::freshness::{self, TIMESTAMP_HEADER};
use crate::response::ResponsePlan;
use crate::signature::{SignatureVerifier, USERNAME_HEADER};

pub const SESSION_HEADER: &str = "X-WAREST-Session";
pub const REGISTRY_HEADER: &str = "X-WAREST-Registry";
pub const EVENT_ID_HEADER: &str = "X-WAREST-Event-Id";
pub const VERSION_HEADER: &str = "X-WAREST-Version";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub method: String,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn post(headers: HeaderList, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: "POST".into(),
            headers,
            body: body.into(),
        }
    }
}

/// One event routed to an output channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelItem {
    pub channel_index: usize,
    pub channel: &'static str,
    pub item: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookOutcome {
    pub status: u16,
    pub body: Option<Value>,
    pub emitted: Option<ChannelItem>,
}

impl WebhookOutcome {
    fn reject(status: u16, message: &str) -> Self {
        Self {
            status,
            body: Some(json!({"ok": false, "message": message})),
            emitted: None,
        }
    }
}

fn unauthorized(message: &str, event: Option<&str>) -> WebhookOutcome {
    let err = WarestError::authentication(message);
    warn!(error = %err, event = ?event, "rejecting warest webhook");
    WebhookOutcome::reject(401, message)
}

pub struct WarestTrigger {
    config: TriggerConfig,
    verifier: SignatureVerifier,
    response: ResponsePlan,
}

impl WarestTrigger {
    /// Validates the secret list and response JSON up front.
    pub fn new(config: TriggerConfig) -> Result<Self, WarestError> {
        let secrets = config.secret_list();
        if config.verify_signature && secrets.is_empty() {
            return Err(WarestError::configuration(
                "at least one webhook secret is required when signature verification is enabled",
            ));
        }
        let response = ResponsePlan::from_config(&config)?;
        let verifier = SignatureVerifier::new(secrets).with_debug(config.debug_signature);
        Ok(Self {
            config,
            verifier,
            response,
        })
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn handle_now(&self, request: &WebhookRequest) -> WebhookOutcome {
        self.handle(request, chrono::Utc::now().timestamp_millis())
    }

    pub fn handle(&self, request: &WebhookRequest, now_ms: i64) -> WebhookOutcome {
        if !request.method.eq_ignore_ascii_case("POST") {
            return WebhookOutcome::reject(405, "Method not allowed");
        }

        let parsed = serde_json::from_slice::<Value>(&request.body).ok();
        let body = match &parsed {
            Some(value) => value.clone(),
            None => json!({ "raw": String::from_utf8_lossy(&request.body) }),
        };
        let event = events::event_name(&request.headers, &body);

        if event.as_deref() == Some(PREFLIGHT) {
            debug!("warest preflight acknowledged");
            return WebhookOutcome {
                status: 200,
                body: Some(json!({"ok": true, "message": PREFLIGHT})),
                emitted: None,
            };
        }

        if self.config.verify_signature
            && !self
                .verifier
                .verify(&request.headers, &request.body, parsed.as_ref())
        {
            return unauthorized("Invalid signature", event.as_deref());
        }

        if self.config.check_timestamp
            && !freshness::is_fresh(
                request.headers.get(TIMESTAMP_HEADER),
                now_ms,
                self.config.timestamp_tolerance_seconds,
            )
        {
            return unauthorized("Stale timestamp", event.as_deref());
        }

        let route = events::route(event.as_deref().unwrap_or_default());
        if !route.matched {
            debug!(event = ?event, "unrecognized warest event, using first channel");
        }
        let item = self.build_item(&request.headers, &body, event, route.channel);
        info!(channel = route.channel, "warest webhook accepted");

        WebhookOutcome {
            status: 200,
            body: self.response.body(),
            emitted: Some(ChannelItem {
                channel_index: route.index,
                channel: route.channel,
                item,
            }),
        }
    }

    fn build_item(
        &self,
        headers: &HeaderList,
        body: &Value,
        event: Option<String>,
        channel: &str,
    ) -> Value {
        let data = body.get("data");
        let meta = |header: &str, key: &str| -> Value {
            headers
                .get_non_empty(header)
                .map(str::to_string)
                .or_else(|| optional_string_from(body, key))
                .or_else(|| data.and_then(|d| optional_string_from(d, key)))
                .map(Value::String)
                .unwrap_or(Value::Null)
        };

        let timestamp = match headers.get_non_empty(TIMESTAMP_HEADER) {
            Some(raw) => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            None => body.get("timestamp").cloned().unwrap_or(Value::Null),
        };

        let mut item = Map::new();
        item.insert("event".into(), Value::from(event));
        item.insert("channel".into(), Value::String(channel.to_string()));
        item.insert("sessionId".into(), meta(SESSION_HEADER, "sessionId"));
        item.insert("registry".into(), meta(REGISTRY_HEADER, "registry"));
        item.insert("eventId".into(), meta(EVENT_ID_HEADER, "eventId"));
        item.insert("version".into(), meta(VERSION_HEADER, "version"));
        item.insert("timestamp".into(), timestamp);
        item.insert(
            "username".into(),
            headers
                .get_non_empty(USERNAME_HEADER)
                .map(|u| Value::String(u.to_string()))
                .unwrap_or(Value::Null),
        );
        let payload = data.cloned().unwrap_or_else(|| body.clone());
        item.insert("payload".into(), payload);
        item.insert("body".into(), body.clone());
        if self.config.include_headers {
            item.insert("headers".into(), headers.to_json());
        }
        Value::Object(item)
    }
}
