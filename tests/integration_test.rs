//! Integration tests for the contact handler
//!
//! Drive the complete chain (normalizer, CORS, bot filter, contact handler) built from
//! configuration, both directly and through the axum router.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use contact_handler::{
    config::Config,
    contact::build_contact_handler,
    delivery::RecordingSender,
    event::{HeaderValue, ProxyEvent, ProxyResponse},
    middleware::{BoxHandler, Handler},
    server::create_router,
};
use std::sync::Arc;
use tower::ServiceExt;

const ORIGIN: &str = "https://www.example.com";
const BROWSER_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Helper to create test configuration
fn create_test_config() -> Config {
    let mut config = Config::default_config();
    config.contact.contact_email = "contact@example.com".to_string();
    config.contact.allow_origins = vec![ORIGIN.to_string()];
    config.contact.blocked_emails = vec!["spam@example.com".to_string()];
    config.validate().unwrap();
    config
}

fn build() -> (BoxHandler, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::new());
    let handler = build_contact_handler(&create_test_config(), sender.clone()).unwrap();
    (handler, sender)
}

fn post(content_type: &str, body: &str) -> ProxyEvent {
    ProxyEvent::new("POST")
        .with_header("Origin", ORIGIN)
        .with_header("User-Agent", BROWSER_UA)
        .with_header("Content-Type", content_type)
        .with_body(body)
}

async fn handle(handler: &BoxHandler, event: ProxyEvent) -> ProxyResponse {
    handler.handle(event).await.unwrap()
}

#[tokio::test]
async fn test_form_submission_delivered() {
    let (handler, sender) = build();

    let response = handle(
        &handler,
        post(
            "application/x-www-form-urlencoded",
            "email=visitor%40example.com&message=Hello%0Avisit+https%3A%2F%2Fexample.org&lang=de",
        ),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Ok!");
    assert_eq!(response.header("access-control-allow-origin"), Some(&HeaderValue::from(ORIGIN)));
    assert_eq!(response.header("vary"), Some(&HeaderValue::from("Origin")));

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_addresses, vec!["contact@example.com"]);
    assert_eq!(sent[0].reply_to_addresses, vec!["visitor@example.com"]);
    assert_eq!(sent[0].subject.data, "Kontaktanfrage");
    assert!(sent[0].html_body.data.starts_with("Hello<br />visit <a href=\"https://example.org\""));
    assert_eq!(sent[0].text_body.data, "Hello\nvisit example.org");
}

#[tokio::test]
async fn test_json_submission_with_charset() {
    let (handler, sender) = build();

    let response = handle(
        &handler,
        post(
            "application/json; charset=UTF-8",
            r#"{"email":"visitor@example.com","message":"<b>Hi</b><script>alert(1)</script>","subject":"Hello"}"#,
        ),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let sent = sender.sent();
    assert_eq!(sent[0].subject.data, "Hello");
    assert_eq!(sent[0].html_body.data, "<b>Hi</b>");
}

#[tokio::test]
async fn test_error_contract() {
    let (handler, sender) = build();

    let cases = [
        ("text/plain", "message=Hello", 400, "UNSUPPORTED_CONTENT_TYPE"),
        ("application/x-www-form-urlencoded", "email=visitor%40example.com", 400, "MISSING_MESSAGE"),
        ("application/x-www-form-urlencoded", "message=Hello", 400, "INVALID_EMAIL"),
        ("application/x-www-form-urlencoded", "email=spam%40example.com&message=Hi", 400, "INVALID_EMAIL"),
        ("application/json", "{broken", 500, ""),
    ];

    for (content_type, body, status, reason) in cases {
        let response = handle(&handler, post(content_type, body)).await;
        assert_eq!(response.status_code, status, "{} {}", content_type, body);
        if !reason.is_empty() {
            assert_eq!(response.body, reason);
        }
        assert_eq!(response.header("access-control-allow-origin"), Some(&HeaderValue::from(ORIGIN)));
    }

    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_bots_rejected() {
    let (handler, sender) = build();

    let event = ProxyEvent::new("POST")
        .with_header("Origin", ORIGIN)
        .with_header("User-Agent", "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body("email=visitor%40example.com&message=Hello");

    let response = handle(&handler, event).await;
    assert_eq!(response.status_code, 401);
    assert_eq!(response.body, "NO_BOTS_ALLOWED");
    assert_eq!(response.header("access-control-allow-origin"), Some(&HeaderValue::from(ORIGIN)));
    assert_eq!(response.header("vary"), Some(&HeaderValue::from("Origin")));
    assert!(sender.sent().is_empty());

    for user_agent in ["axios/1.6.2", "PostmanRuntime/7.36.0", "Google-Read-Aloud"] {
        let event = post("application/x-www-form-urlencoded", "email=visitor%40example.com&message=Hello")
            .with_header("User-Agent", user_agent);
        let response = handle(&handler, event).await;
        assert_eq!(response.status_code, 401, "{}", user_agent);
    }
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_preflight_and_foreign_origin() {
    let (handler, sender) = build();

    let preflight = handle(&handler, ProxyEvent::new("OPTIONS").with_header("Origin", ORIGIN)).await;
    assert_eq!(preflight.status_code, 200);
    assert_eq!(preflight.body, "");
    assert_eq!(preflight.header("access-control-allow-methods"), Some(&HeaderValue::from("OPTIONS,POST")));

    let foreign = handle(
        &handler,
        post("application/x-www-form-urlencoded", "email=visitor%40example.com&message=Hello")
            .with_header("Origin", "https://evil.example.net"),
    )
    .await;
    assert_eq!(foreign.status_code, 200);
    assert_eq!(foreign.header("access-control-allow-origin"), Some(&HeaderValue::Bool(false)));
    assert_eq!(sender.sent().len(), 1);
}

#[tokio::test]
async fn test_router_round_trip() {
    let (handler, sender) = build();
    let router = create_router(handler, 64 * 1024);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("origin", ORIGIN)
                .header("user-agent", BROWSER_UA)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("email=visitor%40example.com&message=Hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], ORIGIN);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Ok!");
    assert_eq!(sender.sent().len(), 1);

    let bot = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("user-agent", "curl/8.4.0")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("email=visitor%40example.com&message=Hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(bot.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(bot.headers()["access-control-allow-origin"], "false");
    let body = to_bytes(bot.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"NO_BOTS_ALLOWED");
}
