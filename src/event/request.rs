//! Inbound request event

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request headers as delivered by the front door
pub type Headers = BTreeMap<String, String>;

/// One inbound HTTP request, shaped like an API gateway proxy event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    /// HTTP method, e.g. `POST`
    pub http_method: String,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: Headers,

    /// Raw body; base64 text when `is_base64_encoded` is set
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// Gateways send `"headers": null` when a request has none
fn deserialize_headers<'de, D>(deserializer: D) -> Result<Headers, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Headers>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProxyEvent {
    pub fn new(http_method: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            path: default_path(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_base64_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.is_base64_encoded = true;
        self
    }

    /// Header lookup by exact key; callers rely on the normalizer for case folding
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_gateway_event() {
        let json = r#"{
            "httpMethod": "POST",
            "headers": {"Content-Type": "application/json"},
            "body": "{}",
            "isBase64Encoded": false
        }"#;
        let event: ProxyEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.http_method, "POST");
        assert_eq!(event.path, "/");
        assert_eq!(event.header("Content-Type"), Some("application/json"));
        assert_eq!(event.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_null_headers() {
        let json = r#"{"httpMethod": "OPTIONS", "headers": null, "body": null}"#;
        let event: ProxyEvent = serde_json::from_str(json).unwrap();
        assert!(event.headers.is_empty());
        assert!(event.body.is_none());
        assert!(!event.is_base64_encoded);
    }
}
