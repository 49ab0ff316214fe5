//! HTTP front door translating requests to proxy events and back

use crate::event::{Headers, ProxyEvent, ProxyResponse};
use crate::middleware::BoxHandler;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Server state
#[derive(Clone)]
pub struct ServerState {
    pub handler: BoxHandler,
}

/// Create HTTP server router
pub fn create_router(handler: BoxHandler, max_body_size: usize) -> Router {
    Router::new()
        .route("/health", get(liveness_handler))
        .route("/", any(contact_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(ServerState { handler })
}

/// Run one event through the chain. Errors that escape the chain are mapped onto the
/// response contract here.
pub async fn dispatch(handler: &BoxHandler, event: ProxyEvent) -> ProxyResponse {
    match handler.handle(event).await {
        Ok(response) => response,
        Err(err) => {
            let status = err.status_code();
            if status < 500 {
                warn!(status, error = %err, "Request rejected before reaching the contact handler");
            } else {
                error!(status, error = %err, "Request failed before reaching the contact handler");
            }
            ProxyResponse::from_error(&err)
        }
    }
}

/// Contact endpoint; accepts any method so preflights reach the CORS layer
async fn contact_handler(State(state): State<ServerState>, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("contact_request", %request_id);

    async move {
        let event = match into_event(request).await {
            Ok(event) => event,
            Err(response) => return response,
        };
        into_response(dispatch(&state.handler, event).await)
    }
    .instrument(span)
    .await
}

/// Liveness probe handler - always returns 200
async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "alive"})))
}

/// Buffer the request into a proxy event. Non-UTF-8 bodies are base64-encoded and flagged.
async fn into_event(request: Request) -> Result<ProxyEvent, Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        warn!("Failed to read request body: {}", e);
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
    })?;

    let mut headers = Headers::new();
    for (name, value) in parts.headers.iter() {
        let Ok(value) = value.to_str() else {
            warn!("Dropping non-text header {}", name);
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push(',');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let (body, is_base64_encoded) = if bytes.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(&bytes) {
            Ok(text) => (Some(text.to_string()), false),
            Err(_) => (Some(STANDARD.encode(&bytes)), true),
        }
    };

    Ok(ProxyEvent {
        http_method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        headers,
        body,
        is_base64_encoded,
    })
}

/// Render a proxy response. Header values are written as text, so the CORS deny
/// sentinel goes out as `false`.
fn into_response(proxy: ProxyResponse) -> Response {
    let body = if proxy.is_base64_encoded {
        match STANDARD.decode(&proxy.body) {
            Ok(bytes) => Body::from(bytes),
            Err(e) => {
                error!("Handler returned invalid base64 body: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    } else {
        Body::from(proxy.body)
    };

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::from_u16(proxy.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in proxy.headers {
        let parsed = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value.to_string()),
        );
        match parsed {
            // Set by the transport from the actual body
            (Ok(name), _) if name == CONTENT_LENGTH => {}
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!("Dropping invalid response header {}", name),
        }
    }
    response
}

/// Start HTTP server
pub async fn start_server(
    addr: &str,
    handler: BoxHandler,
    max_body_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(handler, max_body_size);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Starting graceful shutdown");
}
