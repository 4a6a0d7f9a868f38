//! Static description of one gateway operation.
//!
//! Descriptors are built in `const` context with the chained setters below so
//! the whole catalog lives in a `static` slice.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a free-form options bag lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Query,
    Body,
}

/// Operation-specific normalization run after field copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocess {
    /// `outputFormat` becomes the lower-cased `output` the decrypt endpoint expects.
    DecryptMediaOutput,
    /// Comma or newline separated `phones` text becomes an array.
    PhoneList,
    /// The named body field carries JSON text that must be sent as an object.
    JsonObject(&'static str),
}

/// Composite body fields synthesized from nested UI structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builder {
    Buttons,
    List,
    Location,
    Poll,
    Contact,
    Participants,
    Files,
}

/// A body field that accepts a URL/path/data URI or a binary attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaField {
    pub field: &'static str,
    pub default_mime: &'static str,
    /// Body field filled from the attachment's file name when unset.
    pub file_name_field: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor {
    pub resource: &'static str,
    pub operation: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub path_params: &'static [&'static str],
    pub query_fields: &'static [&'static str],
    pub body_fields: &'static [&'static str],
    pub additional_fields_target: Option<FieldTarget>,
    pub preprocess: Option<Preprocess>,
    pub builder: Option<Builder>,
    pub media: Option<MediaField>,
}

impl OperationDescriptor {
    const fn new(
        resource: &'static str,
        operation: &'static str,
        method: Method,
        path: &'static str,
    ) -> Self {
        Self {
            resource,
            operation,
            method,
            path,
            path_params: &[],
            query_fields: &[],
            body_fields: &[],
            additional_fields_target: None,
            preprocess: None,
            builder: None,
            media: None,
        }
    }

    pub const fn get(resource: &'static str, operation: &'static str, path: &'static str) -> Self {
        Self::new(resource, operation, Method::Get, path)
    }

    pub const fn post(resource: &'static str, operation: &'static str, path: &'static str) -> Self {
        Self::new(resource, operation, Method::Post, path)
    }

    pub const fn delete(
        resource: &'static str,
        operation: &'static str,
        path: &'static str,
    ) -> Self {
        Self::new(resource, operation, Method::Delete, path)
    }

    pub const fn path_params(self, path_params: &'static [&'static str]) -> Self {
        Self {
            path_params,
            ..self
        }
    }

    pub const fn query(self, query_fields: &'static [&'static str]) -> Self {
        Self {
            query_fields,
            ..self
        }
    }

    pub const fn body(self, body_fields: &'static [&'static str]) -> Self {
        Self {
            body_fields,
            ..self
        }
    }

    pub const fn options_to(self, target: FieldTarget) -> Self {
        Self {
            additional_fields_target: Some(target),
            ..self
        }
    }

    pub const fn preprocess(self, preprocess: Preprocess) -> Self {
        Self {
            preprocess: Some(preprocess),
            ..self
        }
    }

    pub const fn builder(self, builder: Builder) -> Self {
        Self {
            builder: Some(builder),
            ..self
        }
    }

    pub const fn media(self, field: &'static str, default_mime: &'static str) -> Self {
        Self {
            media: Some(MediaField {
                field,
                default_mime,
                file_name_field: None,
            }),
            ..self
        }
    }

    pub const fn media_with_file_name(
        self,
        field: &'static str,
        default_mime: &'static str,
        file_name_field: &'static str,
    ) -> Self {
        Self {
            media: Some(MediaField {
                field,
                default_mime,
                file_name_field: Some(file_name_field),
            }),
            ..self
        }
    }

    pub fn key(&self) -> String {
        operation_key(self.resource, self.operation)
    }

    /// Target for the options bag: explicit, else query for GET and body otherwise.
    pub fn options_target(&self) -> FieldTarget {
        match (self.additional_fields_target, self.method) {
            (Some(target), _) => target,
            (None, Method::Get) => FieldTarget::Query,
            (None, _) => FieldTarget::Body,
        }
    }
}

pub fn operation_key(resource: &str, operation: &str) -> String {
    format!("{resource}:{operation}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: OperationDescriptor =
        OperationDescriptor::get("chats", "messages", "/api/v1/chats/{chatId}/messages")
            .path_params(&["chatId"])
            .query(&["sessionId", "limit"]);

    #[test]
    fn const_setters_compose() {
        assert_eq!(SAMPLE.method, Method::Get);
        assert_eq!(SAMPLE.path_params, &["chatId"]);
        assert_eq!(SAMPLE.query_fields.len(), 2);
        assert!(SAMPLE.body_fields.is_empty());
        assert_eq!(SAMPLE.key(), "chats:messages");
    }

    #[test]
    fn options_target_defaults_by_method() {
        assert_eq!(SAMPLE.options_target(), FieldTarget::Query);
        let post = OperationDescriptor::post("groups", "updateSettings", "/x");
        assert_eq!(post.options_target(), FieldTarget::Body);
        let explicit = OperationDescriptor::post("x", "y", "/x").options_to(FieldTarget::Query);
        assert_eq!(explicit.options_target(), FieldTarget::Query);
    }
}
