//! Provider-agnostic outbound email request

use crate::contact::{strip_html, ContactMessage};
use serde::{Deserialize, Serialize};

pub const CHARSET: &str = "UTF-8";

/// A text part tagged with its charset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub charset: String,
    pub data: String,
}

impl EmailContent {
    pub fn utf8(data: impl Into<String>) -> Self {
        Self {
            charset: CHARSET.to_string(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmailRequest {
    pub from_address: String,
    pub to_addresses: Vec<String>,
    pub reply_to_addresses: Vec<String>,
    pub subject: EmailContent,
    pub html_body: EmailContent,
    pub text_body: EmailContent,
}

/// Build the outbound request: sent from and to `destination`, replies go to the
/// submitter, and the text part is the markup-free rendering of the message.
pub fn as_request(message: &ContactMessage, destination: &str) -> OutboundEmailRequest {
    OutboundEmailRequest {
        from_address: destination.to_string(),
        to_addresses: vec![destination.to_string()],
        reply_to_addresses: vec![message.email.clone()],
        subject: EmailContent::utf8(message.subject.clone()),
        html_body: EmailContent::utf8(message.message.clone()),
        text_body: EmailContent::utf8(strip_html(&message.message)),
    }
}
