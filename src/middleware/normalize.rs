//! Header case normalization

use super::{handler_fn, BoxHandler};
use crate::event::{Headers, ProxyEvent};

/// Lower-case every header key **and value**.
///
/// Origin matching downstream compares against the lower-cased `origin` value.
pub fn normalize_headers(headers: &Headers) -> Headers {
    headers
        .iter()
        .map(|(key, value)| (key.to_lowercase(), value.to_lowercase()))
        .collect()
}

/// Middleware that hands the inner handler an event with normalized headers
pub fn normalize_event(inner: BoxHandler) -> BoxHandler {
    handler_fn(move |mut event: ProxyEvent| {
        let inner = inner.clone();
        async move {
            event.headers = normalize_headers(&event.headers);
            inner.handle(event).await
        }
    })
}
