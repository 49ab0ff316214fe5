//! Contact endpoint orchestrator

use super::{body_parse, sanitize, ContactMessage, ContactValidator, LocaleTable};
use crate::delivery::{as_request, EmailSender};
use crate::error::{ContactError, Result};
use crate::event::{make_response, ProxyEvent, ProxyResponse, ResponseHeaders};
use crate::middleware::Handler;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SUCCESS_BODY: &str = "Ok!";

/// Decodes, sanitizes and validates a submission, then hands it to the sender.
///
/// Every failure becomes a response here; `handle` itself never errors.
pub struct ContactHandler {
    contact_email: String,
    sender: Arc<dyn EmailSender>,
    locale: LocaleTable,
    validator: ContactValidator,
}

impl ContactHandler {
    pub fn new(contact_email: impl Into<String>, sender: Arc<dyn EmailSender>) -> Self {
        Self {
            contact_email: contact_email.into(),
            sender,
            locale: LocaleTable::builtin(),
            validator: ContactValidator::default(),
        }
    }

    pub fn with_locale(mut self, locale: LocaleTable) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_validator(mut self, validator: ContactValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Decode, sanitize and validate without sending
    pub fn parse_and_sanitize(&self, event: &ProxyEvent) -> Result<ContactMessage> {
        let fields = body_parse(event)?;
        let message = sanitize(&fields, &self.locale);
        self.validator.validate(message)
    }

    async fn process(&self, event: &ProxyEvent) -> Result<()> {
        let message = self.parse_and_sanitize(event)?;
        debug!("Submission valid, lang={}", message.lang);

        let request = as_request(&message, &self.contact_email);
        self.sender.send(&request).await?;
        info!("Contact email handed to sender");
        Ok(())
    }
}

fn log_failure(err: &ContactError) {
    let status = err.status_code();
    match err.as_http() {
        Some(http) if status < 500 => {
            warn!(status, reason = http.reason(), location = %http.location(), "Contact request rejected")
        }
        _ => error!(status, error = %err, "Contact request failed"),
    }
}

#[async_trait]
impl Handler for ContactHandler {
    async fn handle(&self, event: ProxyEvent) -> Result<ProxyResponse> {
        match self.process(&event).await {
            Ok(()) => Ok(make_response(200, SUCCESS_BODY, ResponseHeaders::new())),
            Err(err) => {
                log_failure(&err);
                Ok(ProxyResponse::from_error(&err))
            }
        }
    }
}
