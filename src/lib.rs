//! Contact Handler - contact-form submissions from browser to mailbox
//!
//! Accepts a contact-form POST shaped like an API gateway proxy event, negotiates CORS,
//! rejects crawlers, decodes JSON or form bodies, sanitizes the submitted markup,
//! validates the result and hands an outbound email request to a pluggable sender.
//!
//! ## Features
//!
//! - **Composable middleware**: handler-wrapping stages built with [`middleware::Pipe`]
//! - **CORS negotiation**: exact, pattern, list and predicate origin rules
//! - **Bot filtering**: user-agent signature matching
//! - **Markup sanitization**: allowlisted tags, autolinking and plain-text rendering
//! - **Pluggable delivery**: log, in-memory or HTTP relay senders
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contact_handler::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_file("config.toml")?;
//!     let handler = build_contact_handler(&config, Arc::new(LogSender))?;
//!
//!     let event = ProxyEvent::new("POST")
//!         .with_header("Origin", "https://example.com")
//!         .with_header("Content-Type", "application/x-www-form-urlencoded")
//!         .with_body("email=visitor%40example.com&message=Hello");
//!
//!     let response = handler.handle(event).await?;
//!     assert_eq!(response.body, "Ok!");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod contact;
pub mod delivery;
pub mod error;
pub mod event;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::Config;
pub use error::{ContactError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::contact::{build_contact_handler, ContactHandler, ContactMessage};
    pub use crate::delivery::{EmailSender, HttpSender, LogSender, OutboundEmailRequest, RecordingSender};
    pub use crate::error::{ContactError, HttpError, Result};
    pub use crate::event::{make_response, HeaderValue, ProxyEvent, ProxyResponse};
    pub use crate::middleware::{pipe, with_cors, BoxHandler, CorsOptions, Handler, Middleware};
}
