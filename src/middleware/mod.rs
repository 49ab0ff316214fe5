//! Middleware components for request processing
//!
//! A middleware is a function from a handler to a handler. Chains are built with
//! [`compose::Pipe`]; see its docs for the order in which the wrapped handlers run.

pub mod bots;
pub mod compose;
pub mod cors;
pub mod normalize;

pub use bots::{block_bots, BotFilter};
pub use compose::{pipe, Pipe, Stage};
pub use cors::{with_cors, AllowOrigin, CorsOptions, OriginPredicate};
pub use normalize::{normalize_event, normalize_headers};

use crate::error::Result;
use crate::event::{ProxyEvent, ProxyResponse};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Processes one event into one response
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: ProxyEvent) -> Result<ProxyResponse>;
}

/// Shared, type-erased handler
pub type BoxHandler = Arc<dyn Handler>;

/// Handler-wrapping function
pub type Middleware = Stage<BoxHandler>;

/// Handler backed by an async closure
struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(ProxyEvent) -> BoxFuture<'static, Result<ProxyResponse>> + Send + Sync,
{
    async fn handle(&self, event: ProxyEvent) -> Result<ProxyResponse> {
        (self.f)(event).await
    }
}

/// Wrap an async closure as a [`BoxHandler`]
pub fn handler_fn<F, Fut>(f: F) -> BoxHandler
where
    F: Fn(ProxyEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProxyResponse>> + Send + 'static,
{
    Arc::new(FnHandler {
        f: move |event| -> BoxFuture<'static, Result<ProxyResponse>> { Box::pin(f(event)) },
    })
}
