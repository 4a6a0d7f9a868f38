use serde::Serialize;
use serde_json::{Map, Value};
use warest_common::helpers::{json_bytes, value_to_text};

use crate::descriptor::Method;

/// A compiled gateway call, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub query: Map<String, Value>,
    /// Absent for GET.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

impl OutboundRequest {
    /// `k=v&...` with both sides percent-encoded; arrays repeat the key.
    pub fn query_string(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            let key = urlencoding::encode(key);
            match value {
                Value::Array(items) => {
                    for item in items {
                        pairs.push(format!("{key}={}", urlencoding::encode(&value_to_text(item))));
                    }
                }
                other => {
                    pairs.push(format!("{key}={}", urlencoding::encode(&value_to_text(other))))
                }
            }
        }
        pairs.join("&")
    }

    pub fn full_url(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{query}", self.url)
        }
    }

    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        self.body.as_ref().map(json_bytes)
    }
}
