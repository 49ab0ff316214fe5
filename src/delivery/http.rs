//! Mail relay client

use super::{EmailSender, OutboundEmailRequest};
use crate::config::DeliveryConfig;
use crate::error::{ContactError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use tracing::{debug, error, info};

/// Posts outbound requests as JSON to a relay endpoint
pub struct HttpSender {
    endpoint: String,
    api_token: Option<Secret<String>>,
    http_client: Client,
}

impl HttpSender {
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| ContactError::Config("http delivery requires an endpoint".to_string()))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Initialized HTTP delivery to {}", endpoint);

        Ok(Self {
            endpoint,
            api_token: config.api_token.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl EmailSender for HttpSender {
    async fn send(&self, request: &OutboundEmailRequest) -> Result<()> {
        debug!("Posting contact email to relay");

        let mut builder = self.http_client.post(&self.endpoint).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("Relay accepted contact email with status {}", status);
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("Relay rejected contact email with status {}: {}", status, error_text);
        Err(ContactError::Delivery(format!(
            "Mail relay returned {}: {}",
            status, error_text
        )))
    }
}
