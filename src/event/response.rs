//! Response shape returned to the front door

use crate::error::ContactError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Header value as carried by a proxy response.
///
/// Gateways accept strings, numbers and booleans; the boolean form carries the
/// CORS deny sentinel (`Access-Control-Allow-Origin: false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Text(String),
    Number(i64),
    Bool(bool),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(s) => f.write_str(s),
            HeaderValue::Number(n) => write!(f, "{}", n),
            HeaderValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, HeaderValue::Text(s) if s == other)
    }
}

/// Response headers keyed by the name as written
pub type ResponseHeaders = BTreeMap<String, HeaderValue>;

/// Canonical result handed back to the front door
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: ResponseHeaders,
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Header lookup ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Maps any pipeline error onto the response contract: carried status (or 500)
    /// and the reason token verbatim as the body.
    pub fn from_error(error: &ContactError) -> Self {
        make_response(error.status_code(), error.to_string(), ResponseHeaders::new())
    }
}

/// Build a response with `content-type: application/json`, overridable by `headers`
pub fn make_response(
    status_code: u16,
    body: impl Into<String>,
    headers: ResponseHeaders,
) -> ProxyResponse {
    let mut merged = ResponseHeaders::new();
    merged.insert("content-type".to_string(), HeaderValue::from("application/json"));
    merged.extend(headers);

    ProxyResponse {
        status_code,
        headers: merged,
        body: body.into(),
        is_base64_encoded: false,
    }
}
