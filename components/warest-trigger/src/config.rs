use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warest_common::WarestError;

pub const DEFAULT_PATH: &str = "warest";
pub const DEFAULT_TOLERANCE_SECONDS: u64 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Bare 200 without a body.
    Empty,
    #[default]
    Ack,
    Static,
}

/// Trigger node settings as stored by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TriggerConfig {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub verify_signature: bool,
    /// Comma or newline separated list; every entry is accepted.
    #[serde(default)]
    pub secrets: String,
    #[serde(default)]
    pub check_timestamp: bool,
    #[serde(default = "default_tolerance")]
    pub timestamp_tolerance_seconds: u64,
    #[serde(default)]
    pub debug_signature: bool,
    #[serde(default)]
    pub response_mode: ResponseMode,
    /// JSON object text returned in `static` mode.
    #[serde(default)]
    pub static_response: String,
    /// JSON array (or single object) text attached as `actions`.
    #[serde(default)]
    pub response_actions: String,
    #[serde(default)]
    pub response_delay_ms: Option<u64>,
    #[serde(default)]
    pub include_headers: bool,
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_true() -> bool {
    true
}

fn default_tolerance() -> u64 {
    DEFAULT_TOLERANCE_SECONDS
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            verify_signature: true,
            secrets: String::new(),
            check_timestamp: false,
            timestamp_tolerance_seconds: DEFAULT_TOLERANCE_SECONDS,
            debug_signature: false,
            response_mode: ResponseMode::Ack,
            static_response: String::new(),
            response_actions: String::new(),
            response_delay_ms: None,
            include_headers: false,
        }
    }
}

impl TriggerConfig {
    pub fn from_value(value: &Value) -> Result<Self, WarestError> {
        serde_json::from_value(value.clone())
            .map_err(|e| WarestError::configuration(format!("invalid trigger config: {e}")))
    }

    pub fn secret_list(&self) -> Vec<String> {
        parse_secrets(&self.secrets)
    }

    /// Route path with surrounding slashes removed.
    pub fn route(&self) -> String {
        let trimmed = self.path.trim().trim_matches('/');
        if trimmed.is_empty() {
            format!("/{DEFAULT_PATH}")
        } else {
            format!("/{trimmed}")
        }
    }

    pub fn static_body(&self) -> Result<Option<Map<String, Value>>, WarestError> {
        if self.response_mode != ResponseMode::Static {
            return Ok(None);
        }
        let text = self.static_response.trim();
        if text.is_empty() {
            return Ok(Some(Map::new()));
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(WarestError::configuration("static response must be a JSON object")),
            Err(e) => {
                Err(WarestError::configuration(format!("static response is not valid JSON: {e}")))
            }
        }
    }

    pub fn actions(&self) -> Result<Option<Vec<Value>>, WarestError> {
        let text = self.response_actions.trim();
        if text.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => Ok(Some(items)),
            Ok(single @ Value::Object(_)) => Ok(Some(vec![single])),
            Ok(_) => {
                Err(WarestError::configuration("response actions must be a JSON array or object"))
            }
            Err(e) => {
                Err(WarestError::configuration(format!("response actions are not valid JSON: {e}")))
            }
        }
    }
}

/// Split on commas and newlines, trim, drop empties.
pub fn parse_secrets(raw: &str) -> Vec<String> {
    raw.split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_verify_with_ack() {
        let config = TriggerConfig::from_value(&json!({})).unwrap();
        assert!(config.verify_signature);
        assert_eq!(config.response_mode, ResponseMode::Ack);
        assert_eq!(config.timestamp_tolerance_seconds, 300);
        assert_eq!(config.route(), "/warest");
    }

    #[test]
    fn secrets_split_on_commas_and_newlines() {
        assert_eq!(
            parse_secrets(" abc ,\nxyz\r\n,, "),
            vec!["abc".to_string(), "xyz".to_string()]
        );
        assert!(parse_secrets(" , \n").is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = TriggerConfig::from_value(&json!({"secret": "abc"})).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn static_body_must_be_an_object() {
        let config = TriggerConfig {
            response_mode: ResponseMode::Static,
            static_response: "[1]".into(),
            ..TriggerConfig::default()
        };
        assert!(matches!(config.static_body(), Err(WarestError::Configuration(_))));

        let config = TriggerConfig {
            response_mode: ResponseMode::Static,
            static_response: r#"{"reply":"ok"}"#.into(),
            ..TriggerConfig::default()
        };
        assert_eq!(config.static_body().unwrap().unwrap()["reply"], json!("ok"));
    }

    #[test]
    fn actions_accept_array_or_object() {
        let mut config = TriggerConfig {
            response_actions: r#"{"type":"typing"}"#.into(),
            ..TriggerConfig::default()
        };
        assert_eq!(config.actions().unwrap().unwrap().len(), 1);
        config.response_actions = "{not json".into();
        assert!(config.actions().is_err());
        config.response_actions = "42".into();
        assert!(config.actions().is_err());
    }

    #[test]
    fn route_is_normalized() {
        let config = TriggerConfig {
            path: "/hooks/wa/".into(),
            ..TriggerConfig::default()
        };
        assert_eq!(config.route(), "/hooks/wa");
    }
}
