//! Types shared by the WARest action and trigger components.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod credentials;
pub mod headers;
pub mod helpers;

pub use credentials::Credentials;
pub use headers::HeaderList;

/// Common error type the components use to surface failures.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum WarestError {
    #[error("unsupported operation: {resource}:{operation}")]
    UnsupportedOperation { resource: String, operation: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl WarestError {
    pub fn unsupported(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        WarestError::UnsupportedOperation {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        WarestError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        WarestError::Configuration(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        WarestError::Authentication(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        WarestError::Transport(msg.into())
    }

    /// Whether a batch may retry the item. Only transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WarestError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_validation_error() {
        let err = WarestError::validation("at least one poll option is required");
        assert_eq!(
            err,
            WarestError::Validation("at least one poll option is required".into())
        );
        assert_eq!(
            err.to_string(),
            "validation error: at least one poll option is required"
        );
    }

    #[test]
    fn unsupported_operation_names_the_key() {
        let err = WarestError::unsupported("messages", "sendFax");
        assert_eq!(err.to_string(), "unsupported operation: messages:sendFax");
        assert!(!err.is_retryable());
    }

    #[test]
    fn serializes_as_tagged_json() {
        let err = WarestError::configuration("bad static response");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["Configuration"], "bad static response");
    }
}
