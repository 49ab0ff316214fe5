//! Content-type aware body decoding

use super::FieldMap;
use crate::error::{HttpError, Result};
use crate::event::ProxyEvent;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::debug;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Decode the event body into a flat field map, dispatching on `content-type`.
///
/// Expects normalized (lower-cased) headers. A missing or unknown content type fails
/// with `UNSUPPORTED_CONTENT_TYPE` (400).
pub fn body_parse(event: &ProxyEvent) -> Result<FieldMap> {
    let content_type = event.header("content-type").map(media_type);
    debug!("Decoding body with content type {:?}", content_type);

    match content_type {
        Some(JSON) => parse_json(&body_text(event)?),
        Some(FORM) => parse_form(&body_text(event)?),
        _ => Err(HttpError::unsupported_content_type().into()),
    }
}

/// Media type without parameters, e.g. `application/json; charset=utf-8` → `application/json`
fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

/// Body as text, base64-decoded when flagged. Invalid UTF-8 is replaced, not rejected.
fn body_text(event: &ProxyEvent) -> Result<String> {
    let body = event.body.as_deref().unwrap_or_default();
    if !event.is_base64_encoded {
        return Ok(body.to_string());
    }
    let bytes = STANDARD.decode(body.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Top-level JSON object into fields. Empty input is an empty map; so is any
/// non-object document.
fn parse_json(text: &str) -> Result<FieldMap> {
    if text.trim().is_empty() {
        return Ok(FieldMap::new());
    }

    let Value::Object(object) = serde_json::from_str::<Value>(text)? else {
        return Ok(FieldMap::new());
    };

    Ok(object
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect())
}

/// Query-string pairs into fields; repeated keys are joined with `,`
fn parse_form(text: &str) -> Result<FieldMap> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(text)?;
    let mut fields = FieldMap::new();
    for (key, value) in pairs {
        fields
            .entry(key)
            .and_modify(|existing: &mut String| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }
    Ok(fields)
}
