use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::WarestError;

pub const API_KEY_HEADER: &str = "X-WAREST-API-KEY";
pub const CREDENTIAL_TEST_PATH: &str = "/api/v1/server/info";

/// Stored credential record: gateway base URL plus API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Credentials {
    pub base_url: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, WarestError> {
        let creds = serde_json::from_value::<Credentials>(value.clone())
            .map_err(|e| WarestError::configuration(format!("invalid credentials: {e}")))?;
        creds.validate()?;
        Ok(creds)
    }

    pub fn validate(&self) -> Result<(), WarestError> {
        if self.base_url.trim().is_empty() {
            return Err(WarestError::configuration("credentials: baseUrl is required"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(WarestError::configuration("credentials: baseUrl must be an absolute URL"));
        }
        if self.api_key.trim().is_empty() {
            return Err(WarestError::configuration("credentials: apiKey is required"));
        }
        Ok(())
    }

    /// Base URL with trailing slashes stripped.
    pub fn base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Headers attached to every gateway call.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        let key = self.api_key.trim();
        vec![
            (API_KEY_HEADER.to_string(), key.to_string()),
            ("Authorization".to_string(), format!("Bearer {key}")),
        ]
    }

    pub fn test_url(&self) -> String {
        self.url_for(CREDENTIAL_TEST_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_trailing_slashes() {
        let creds = Credentials::new("https://wa.example.com///", "k");
        assert_eq!(creds.base_url(), "https://wa.example.com");
        assert_eq!(
            creds.test_url(),
            "https://wa.example.com/api/v1/server/info"
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Credentials::from_value(&json!({
            "baseUrl": "https://wa.example.com",
            "apiKey": "k",
            "extra": true
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn requires_absolute_base_url() {
        let err = Credentials::from_value(&json!({"baseUrl": "wa.example.com", "apiKey": "k"}))
            .unwrap_err();
        assert!(matches!(err, WarestError::Configuration(_)));
    }

    #[test]
    fn auth_headers_carry_key_twice() {
        let creds = Credentials::new("https://wa.example.com", " secret ");
        let headers = creds.auth_headers();
        assert_eq!(
            headers[0],
            (API_KEY_HEADER.to_string(), "secret".to_string())
        );
        assert_eq!(
            headers[1],
            ("Authorization".to_string(), "Bearer secret".to_string())
        );
    }
}
