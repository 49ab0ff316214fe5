//! Outbound email delivery

pub mod http;
pub mod request;

pub use http::HttpSender;
pub use request::{as_request, EmailContent, OutboundEmailRequest};

use crate::config::{DeliveryConfig, DeliveryKind};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Hands an outbound request to a mail transport
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, request: &OutboundEmailRequest) -> Result<()>;
}

/// Logs the request instead of delivering it
#[derive(Debug, Default, Clone)]
pub struct LogSender;

#[async_trait]
impl EmailSender for LogSender {
    async fn send(&self, request: &OutboundEmailRequest) -> Result<()> {
        info!(
            from = %request.from_address,
            to = ?request.to_addresses,
            subject = %request.subject.data,
            "Contact email accepted (log delivery)"
        );
        Ok(())
    }
}

/// Keeps every request in memory
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutboundEmailRequest>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundEmailRequest> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, request: &OutboundEmailRequest) -> Result<()> {
        // A panic elsewhere while holding the lock leaves the list intact
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(())
    }
}

/// Sender selected by the delivery configuration
pub fn sender_from_config(config: &DeliveryConfig) -> Result<Arc<dyn EmailSender>> {
    match config.kind {
        DeliveryKind::Log => Ok(Arc::new(LogSender)),
        DeliveryKind::Http => Ok(Arc::new(HttpSender::new(config)?)),
    }
}
