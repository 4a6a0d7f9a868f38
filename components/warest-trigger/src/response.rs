use serde_json::{Map, Value, json};
use warest_common::WarestError;

use crate::config::{ResponseMode, TriggerConfig};

/// Response body for accepted webhooks, resolved once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePlan {
    mode: ResponseMode,
    static_body: Map<String, Value>,
    actions: Option<Vec<Value>>,
    delay_ms: Option<u64>,
}

impl ResponsePlan {
    /// Fails on malformed static response or actions JSON.
    pub fn from_config(config: &TriggerConfig) -> Result<Self, WarestError> {
        Ok(Self {
            mode: config.response_mode,
            static_body: config.static_body()?.unwrap_or_default(),
            actions: config.actions()?,
            delay_ms: config.response_delay_ms.filter(|ms| *ms > 0),
        })
    }

    pub fn body(&self) -> Option<Value> {
        let mut body = match self.mode {
            ResponseMode::Empty => return None,
            ResponseMode::Ack => {
                let mut map = Map::new();
                map.insert("ok".into(), Value::Bool(true));
                map
            }
            ResponseMode::Static => self.static_body.clone(),
        };
        if let Some(actions) = &self.actions {
            body.insert("actions".into(), Value::Array(actions.clone()));
        }
        if let Some(delay) = self.delay_ms {
            body.insert("delayMs".into(), json!(delay));
        }
        Some(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(config: TriggerConfig) -> ResponsePlan {
        ResponsePlan::from_config(&config).unwrap()
    }

    #[test]
    fn empty_mode_has_no_body() {
        let plan = plan(TriggerConfig {
            response_mode: ResponseMode::Empty,
            response_actions: "[{\"type\":\"read\"}]".into(),
            ..TriggerConfig::default()
        });
        assert_eq!(plan.body(), None);
    }

    #[test]
    fn ack_is_augmented() {
        let plan = plan(TriggerConfig {
            response_actions: "[{\"type\":\"read\"}]".into(),
            response_delay_ms: Some(250),
            ..TriggerConfig::default()
        });
        assert_eq!(
            plan.body(),
            Some(json!({"ok": true, "actions": [{"type": "read"}], "delayMs": 250}))
        );
    }

    #[test]
    fn static_body_is_returned() {
        let plan = plan(TriggerConfig {
            response_mode: ResponseMode::Static,
            static_response: "{\"reply\":\"thanks\"}".into(),
            ..TriggerConfig::default()
        });
        assert_eq!(plan.body(), Some(json!({"reply": "thanks"})));
    }

    #[test]
    fn malformed_static_json_is_a_configuration_error() {
        let err = ResponsePlan::from_config(&TriggerConfig {
            response_mode: ResponseMode::Static,
            static_response: "{oops".into(),
            ..TriggerConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, WarestError::Configuration(_)));
    }
}
