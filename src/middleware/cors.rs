//! CORS negotiation middleware

use super::{handler_fn, BoxHandler, Middleware};
use crate::event::{HeaderValue, ProxyEvent, ProxyResponse, ResponseHeaders};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_ALLOW_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";
const DEFAULT_ALLOW_HEADERS: &str = "Content-Type,Accept,Referer,User-Agent,DNT";

/// Custom origin check receiving the origin and the full event
pub type OriginPredicate = Arc<dyn Fn(&str, &ProxyEvent) -> bool + Send + Sync>;

/// Which origins may read responses
#[derive(Clone)]
pub enum AllowOrigin {
    Exact(String),
    Pattern(Regex),
    /// First match wins; nested lists are evaluated the same way
    List(Vec<AllowOrigin>),
    Predicate(OriginPredicate),
}

impl AllowOrigin {
    pub fn exact(origin: impl Into<String>) -> Self {
        AllowOrigin::Exact(origin.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &ProxyEvent) -> bool + Send + Sync + 'static,
    {
        AllowOrigin::Predicate(Arc::new(f))
    }

    pub fn is_allowed(&self, origin: &str, event: &ProxyEvent) -> bool {
        match self {
            AllowOrigin::Exact(allowed) => origin == allowed,
            AllowOrigin::Pattern(pattern) => pattern.is_match(origin),
            AllowOrigin::List(entries) => entries.iter().any(|entry| entry.is_allowed(origin, event)),
            AllowOrigin::Predicate(f) => f(origin, event),
        }
    }
}

impl fmt::Debug for AllowOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowOrigin::Exact(origin) => f.debug_tuple("Exact").field(origin).finish(),
            AllowOrigin::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            AllowOrigin::List(entries) => f.debug_tuple("List").field(entries).finish(),
            AllowOrigin::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for AllowOrigin {
    fn from(origin: &str) -> Self {
        AllowOrigin::exact(origin)
    }
}

impl From<Regex> for AllowOrigin {
    fn from(pattern: Regex) -> Self {
        AllowOrigin::Pattern(pattern)
    }
}

impl<T: Into<AllowOrigin>> From<Vec<T>> for AllowOrigin {
    fn from(entries: Vec<T>) -> Self {
        AllowOrigin::List(entries.into_iter().map(Into::into).collect())
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsOptions {
    pub allow_origin: AllowOrigin,
    /// `None` means `GET,HEAD,PUT,PATCH,POST,DELETE`
    pub allow_methods: Option<Vec<String>>,
    /// `None` means `Content-Type,Accept,Referer,User-Agent,DNT`
    pub allow_headers: Option<Vec<String>>,
}

impl CorsOptions {
    pub fn new(allow_origin: impl Into<AllowOrigin>) -> Self {
        Self {
            allow_origin: allow_origin.into(),
            allow_methods: None,
            allow_headers: None,
        }
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Headers to attach for `event`. A missing `origin` header is never allowed.
    pub fn headers_for(&self, event: &ProxyEvent) -> ResponseHeaders {
        let origin = event.header("origin");
        let allowed = origin.is_some_and(|origin| self.allow_origin.is_allowed(origin, event));

        let allow_origin = match origin {
            Some(origin) if allowed => HeaderValue::from(origin),
            _ => {
                debug!("Origin not allowed: {}", origin.unwrap_or("<none>"));
                HeaderValue::Bool(false)
            }
        };

        let mut headers = ResponseHeaders::new();
        headers.insert("Content-Type".to_string(), "application/json".into());
        headers.insert("Vary".to_string(), "Origin".into());
        headers.insert("Access-Control-Allow-Origin".to_string(), allow_origin);
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            join_or(&self.allow_methods, DEFAULT_ALLOW_METHODS).into(),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            join_or(&self.allow_headers, DEFAULT_ALLOW_HEADERS).into(),
        );
        headers
    }
}

fn join_or(values: &Option<Vec<String>>, default: &str) -> String {
    match values {
        Some(values) => values.join(","),
        None => default.to_string(),
    }
}

/// Preflight answer: 200, empty body, CORS headers plus `Content-Length: 0`
fn preflight_response(mut headers: ResponseHeaders) -> ProxyResponse {
    headers.insert("Content-Length".to_string(), "0".into());
    ProxyResponse {
        status_code: 200,
        headers,
        body: String::new(),
        is_base64_encoded: false,
    }
}

/// Put CORS headers under the handler's own; the handler wins on a name clash
fn merge_defaults(response: &mut ProxyResponse, defaults: ResponseHeaders) {
    for (name, value) in defaults {
        if !response.has_header(&name) {
            response.headers.insert(name, value);
        }
    }
}

/// CORS middleware.
///
/// `OPTIONS` requests are answered here and never reach `inner`; everything else is
/// passed through and decorated. An error from `inner` is turned into its status and
/// reason body first, so rejections from wrapped filters still carry CORS headers.
pub fn with_cors(options: CorsOptions) -> Middleware {
    let options = Arc::new(options);
    Box::new(move |inner: BoxHandler| {
        let options = options.clone();
        handler_fn(move |event: ProxyEvent| {
            let options = options.clone();
            let inner = inner.clone();
            async move {
                let headers = options.headers_for(&event);

                if event.http_method == "OPTIONS" {
                    debug!("Answering CORS preflight");
                    return Ok(preflight_response(headers));
                }

                let mut response = match inner.handle(event).await {
                    Ok(response) => response,
                    Err(err) => {
                        debug!("Rendering {} error from wrapped handler", err.status_code());
                        ProxyResponse::from_error(&err)
                    }
                };
                merge_defaults(&mut response, headers);
                Ok(response)
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContactError, HttpError};
    use crate::event::{make_response, ResponseHeaders};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn success_handler() -> BoxHandler {
        handler_fn(|_event: ProxyEvent| async move {
            Ok(ProxyResponse {
                status_code: 200,
                headers: ResponseHeaders::new(),
                body: "Success".to_string(),
                is_base64_encoded: false,
            })
        })
    }

    fn post_from(origin: &str) -> ProxyEvent {
        ProxyEvent::new("POST")
            .with_header("origin", origin)
            .with_body("message=Message")
    }

    async fn run(options: CorsOptions, event: ProxyEvent) -> ProxyResponse {
        with_cors(options)(success_handler()).handle(event).await.unwrap()
    }

    #[tokio::test]
    async fn test_exact_origin_allowed() {
        let response = run(
            CorsOptions::new("https://www.example.com"),
            post_from("https://www.example.com"),
        )
        .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "Success");
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some(&HeaderValue::from("https://www.example.com"))
        );
        assert_eq!(response.header("Vary"), Some(&HeaderValue::from("Origin")));
    }

    #[tokio::test]
    async fn test_invalid_origin_gets_false() {
        let response = run(
            CorsOptions::new("https://www.example.com"),
            post_from("https://www.wrong.com"),
        )
        .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "Success");
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some(&HeaderValue::Bool(false)));
        assert_eq!(response.header("Vary"), Some(&HeaderValue::from("Origin")));
    }

    #[tokio::test]
    async fn test_predicate_origin() {
        let seen_body = Arc::new(AtomicBool::new(false));
        let seen = seen_body.clone();
        let options = CorsOptions::new(AllowOrigin::predicate(move |_origin, event| {
            seen.store(event.body.is_some(), Ordering::SeqCst);
            true
        }));

        let response = run(options, post_from("https://www.example.com")).await;
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some(&HeaderValue::from("https://www.example.com"))
        );
        assert!(seen_body.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_list_origins() {
        let options = CorsOptions::new(vec!["https://www.example.com", "https://www.sample.com"]);

        let allowed = run(options.clone(), post_from("https://www.sample.com")).await;
        assert_eq!(
            allowed.header("Access-Control-Allow-Origin"),
            Some(&HeaderValue::from("https://www.sample.com"))
        );

        let denied = run(options, post_from("https://www.wrong.com")).await;
        assert_eq!(denied.header("Access-Control-Allow-Origin"), Some(&HeaderValue::Bool(false)));
    }

    #[tokio::test]
    async fn test_nested_list_with_pattern() {
        let options = CorsOptions::new(AllowOrigin::List(vec![
            AllowOrigin::exact("https://a.test"),
            AllowOrigin::List(vec![AllowOrigin::Pattern(Regex::new(r"example\.com$").unwrap())]),
        ]));

        let response = run(options, post_from("https://www.example.com")).await;
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some(&HeaderValue::from("https://www.example.com"))
        );
    }

    #[tokio::test]
    async fn test_missing_origin_is_denied() {
        let options = CorsOptions::new(AllowOrigin::predicate(|_, _| true));
        let response = run(options, ProxyEvent::new("POST")).await;
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some(&HeaderValue::Bool(false)));
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let inner = handler_fn(move |_event: ProxyEvent| {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(make_response(500, "should not run", ResponseHeaders::new()))
            }
        });

        for origin in ["https://www.example.com", "https://www.wrong.com"] {
            let handler = with_cors(CorsOptions::new("https://www.example.com"))(inner.clone());
            let event = ProxyEvent::new("OPTIONS")
                .with_header("origin", origin)
                .with_body("message=Message");
            let response = handler.handle(event).await.unwrap();

            assert_eq!(response.status_code, 200);
            assert_eq!(response.body, "");
            assert_eq!(response.header("Content-Length"), Some(&HeaderValue::from("0")));
            assert_eq!(response.header("Vary"), Some(&HeaderValue::from("Origin")));
        }
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_default_and_configured_lists() {
        let defaults = run(CorsOptions::new("x"), post_from("x")).await;
        assert_eq!(
            defaults.header("Access-Control-Allow-Methods"),
            Some(&HeaderValue::from("GET,HEAD,PUT,PATCH,POST,DELETE"))
        );
        assert_eq!(
            defaults.header("Access-Control-Allow-Headers"),
            Some(&HeaderValue::from("Content-Type,Accept,Referer,User-Agent,DNT"))
        );

        let configured = run(
            CorsOptions::new("x").with_methods(["OPTIONS", "POST"]).with_headers(["Content-Type"]),
            post_from("x"),
        )
        .await;
        assert_eq!(
            configured.header("Access-Control-Allow-Methods"),
            Some(&HeaderValue::from("OPTIONS,POST"))
        );
        assert_eq!(
            configured.header("Access-Control-Allow-Headers"),
            Some(&HeaderValue::from("Content-Type"))
        );
    }

    #[tokio::test]
    async fn test_handler_headers_win() {
        let inner = handler_fn(|_event: ProxyEvent| async move {
            let mut headers = ResponseHeaders::new();
            headers.insert("vary".to_string(), "Accept".into());
            Ok(make_response(200, "Ok!", headers))
        });
        let handler = with_cors(CorsOptions::new("x"))(inner);
        let response = handler.handle(post_from("x")).await.unwrap();

        assert_eq!(response.header("Vary"), Some(&HeaderValue::from("Accept")));
        assert_eq!(response.headers.keys().filter(|k| k.eq_ignore_ascii_case("vary")).count(), 1);
        assert_eq!(response.headers.keys().filter(|k| k.eq_ignore_ascii_case("content-type")).count(), 1);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some(&HeaderValue::from("x")));
    }

    #[tokio::test]
    async fn test_inner_rejection_carries_cors_headers() {
        let inner = handler_fn(|_event: ProxyEvent| async move {
            Err::<ProxyResponse, ContactError>(HttpError::no_bots_allowed().into())
        });
        let handler = with_cors(CorsOptions::new("https://www.example.com"))(inner);

        let response = handler.handle(post_from("https://www.example.com")).await.unwrap();
        assert_eq!(response.status_code, 401);
        assert_eq!(response.body, "NO_BOTS_ALLOWED");
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some(&HeaderValue::from("https://www.example.com"))
        );
        assert_eq!(response.header("Vary"), Some(&HeaderValue::from("Origin")));

        let denied = handler.handle(post_from("https://www.wrong.com")).await.unwrap();
        assert_eq!(denied.status_code, 401);
        assert_eq!(denied.header("Access-Control-Allow-Origin"), Some(&HeaderValue::Bool(false)));
    }
}
