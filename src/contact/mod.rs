//! Contact submission processing: decoding, sanitization, validation and hand-off

pub mod body;
pub mod handler;
pub mod html;
pub mod locale;
pub mod sanitize;
pub mod validator;

pub use body::body_parse;
pub use handler::ContactHandler;
pub use html::{sanitize_html, strip_html};
pub use locale::LocaleTable;
pub use sanitize::sanitize;
pub use validator::{is_valid_email, Blocklist, ContactValidator};

use crate::config::Config;
use crate::delivery::EmailSender;
use crate::error::{ErrorContext, Result};
use crate::middleware::{normalize_event, with_cors, BotFilter, BoxHandler, Pipe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Flat field mapping decoded from a request body
pub type FieldMap = BTreeMap<String, String>;

/// A sanitized contact submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub email: String,
    pub message: String,
    pub subject: String,
    pub lang: String,
}

impl ContactMessage {
    /// Fields as error context
    pub fn to_context(&self) -> ErrorContext {
        let mut context = ErrorContext::new();
        context.insert("email".to_string(), self.email.clone());
        context.insert("message".to_string(), self.message.clone());
        context.insert("subject".to_string(), self.subject.clone());
        context.insert("lang".to_string(), self.lang.clone());
        context
    }
}

/// Build the complete contact endpoint from configuration and a sender.
///
/// Stages are listed innermost first. At request time they run in reverse: header
/// normalization, then CORS, then the bot filter, then the contact handler.
pub fn build_contact_handler(config: &Config, sender: Arc<dyn EmailSender>) -> Result<BoxHandler> {
    let contact = &config.contact;
    let handler = ContactHandler::new(contact.contact_email.clone(), sender)
        .with_locale(config.locale.table())
        .with_validator(ContactValidator::new(Blocklist::with_extra(&contact.blocked_emails)));

    let mut chain = Pipe::new();
    if contact.block_bots {
        let filter = Arc::new(BotFilter::with_extra_patterns(&contact.bot_patterns)?);
        chain = chain.then(filter.layer());
    }
    let chain = chain.then(with_cors(contact.cors_options()?)).then(normalize_event);

    info!(
        "Contact handler built with {} middleware stages (bot filter: {})",
        chain.len(),
        contact.block_bots
    );
    Ok(chain.apply(Arc::new(handler)))
}
