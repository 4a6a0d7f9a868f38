//! Sends compiled requests to the gateway.

use std::io::Read;
use std::time::Duration;

use http::Request;
use serde_json::{Value, json};
use tracing::{debug, warn};
use ureq::Agent;
use warest_common::{Credentials, WarestError};
use warest_runtime_config::NetworkConfig;

use crate::request::OutboundRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCall {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The seam between the dispatcher and the network.
pub trait HttpTransport {
    fn send(&self, call: &HttpCall) -> Result<HttpReply, String>;
}

pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout_ms: Option<u64>) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout_ms.map(Duration::from_millis))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl HttpTransport for UreqTransport {
    fn send(&self, call: &HttpCall) -> Result<HttpReply, String> {
        let mut builder = Request::builder()
            .method(call.method.as_str())
            .uri(&call.url);
        for (name, value) in &call.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = match &call.body {
            Some(bytes) => {
                let request = builder
                    .body(bytes.clone())
                    .map_err(|err| format!("invalid request: {err}"))?;
                self.agent.run(request)
            }
            None => {
                let request = builder
                    .body(())
                    .map_err(|err| format!("invalid request: {err}"))?;
                self.agent.run(request)
            }
        }
        .map_err(|err| err.to_string())?;
        let status = response.status().as_u16();
        let mut body = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| format!("failed to read response: {err}"))?;
        Ok(HttpReply { status, body })
    }
}

pub struct Dispatcher<T: HttpTransport = UreqTransport> {
    creds: Credentials,
    network: NetworkConfig,
    transport: T,
}

impl Dispatcher<UreqTransport> {
    pub fn new(creds: Credentials, network: NetworkConfig) -> Self {
        let transport = UreqTransport::new(network.timeout_ms);
        Self::with_transport(creds, network, transport)
    }
}

impl<T: HttpTransport> Dispatcher<T> {
    pub fn with_transport(creds: Credentials, network: NetworkConfig, transport: T) -> Self {
        Self {
            creds,
            network,
            transport,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn send(&self, request: &OutboundRequest) -> Result<Value, WarestError> {
        let body = request.body_bytes();
        let mut headers = self.creds.auth_headers();
        if body.is_some() {
            headers.push(("Content-Type".into(), "application/json".into()));
        }
        headers.push(("Accept".into(), "application/json".into()));
        let call = HttpCall {
            method: request.method.as_str().to_string(),
            url: request.full_url(),
            headers,
            body,
        };
        self.send_with_retries(&call)
    }

    /// `GET {baseUrl}/api/v1/server/info` with the stored credentials.
    pub fn test_credentials(&self) -> Result<Value, WarestError> {
        let mut headers = self.creds.auth_headers();
        headers.push(("Accept".into(), "application/json".into()));
        let call = HttpCall {
            method: "GET".into(),
            url: self.creds.test_url(),
            headers,
            body: None,
        };
        self.send_with_retries(&call)
    }

    fn send_with_retries(&self, call: &HttpCall) -> Result<Value, WarestError> {
        let attempts = self.network.attempts();
        let mut last_err = None;
        for attempt in 1..=attempts {
            debug!(method = %call.method, url = %call.url, attempt, "sending warest request");
            match self.transport.send(call) {
                Ok(reply) if (200..300).contains(&reply.status) => {
                    return Ok(parse_reply(&reply.body));
                }
                Ok(reply) => {
                    let err = status_error(&reply);
                    if reply.status < 500 {
                        return Err(err);
                    }
                    warn!(status = reply.status, attempt, "warest server error");
                    last_err = Some(err);
                }
                Err(message) => {
                    warn!(error = %message, attempt, "warest transport failure");
                    last_err = Some(WarestError::transport(message));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| WarestError::transport("request was not attempted")))
    }
}

fn status_error(reply: &HttpReply) -> WarestError {
    let detail = serde_json::from_slice::<Value>(&reply.body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
    match detail {
        Some(detail) => {
            WarestError::transport(format!("warest returned status {}: {detail}", reply.status))
        }
        None => WarestError::transport(format!("warest returned status {}", reply.status)),
    }
}

/// Objects pass through, other JSON and plain text are wrapped as `{data}`, and an
/// empty body becomes `{ok: true}`.
pub fn parse_reply(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return json!({"ok": true});
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => json!({ "data": other }),
        Err(_) => json!({ "data": String::from_utf8_lossy(body) }),
    }
}
