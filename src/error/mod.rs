//! Error types for the contact request pipeline

use std::collections::BTreeMap;
use std::panic::Location;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ContactError>;

/// Flat field mapping attached to structured errors as context
pub type ErrorContext = BTreeMap<String, String>;

/// Reason tokens used verbatim as response bodies
pub mod reasons {
    pub const MISSING_MESSAGE: &str = "MISSING_MESSAGE";
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const UNSUPPORTED_CONTENT_TYPE: &str = "UNSUPPORTED_CONTENT_TYPE";
    pub const NO_BOTS_ALLOWED: &str = "NO_BOTS_ALLOWED";
}

/// Main error type for the contact request pipeline
#[derive(Error, Debug)]
pub enum ContactError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("{0}")]
    Delivery(String),

    #[error("{0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ContactError {
    /// HTTP status to answer with: the carried code for structured errors, 500 otherwise
    pub fn status_code(&self) -> u16 {
        match self {
            ContactError::Http(e) => e.status_code(),
            _ => HttpError::DEFAULT_STATUS,
        }
    }

    /// The structured error, if this is one
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            ContactError::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// A structured, inspectable error: reason token, HTTP status and optional context.
///
/// Values are immutable once built. The source location of the constructor call is
/// captured so logs can point at where the error was raised.
#[derive(Error, Debug, Clone)]
#[error("{reason}")]
pub struct HttpError {
    reason: String,
    status_code: u16,
    context: Option<ErrorContext>,
    location: &'static Location<'static>,
}

impl HttpError {
    pub const DEFAULT_STATUS: u16 = 500;

    /// New error with the default 500 status
    #[track_caller]
    pub fn new(reason: impl Into<String>) -> Self {
        Self::with_status(reason, Self::DEFAULT_STATUS)
    }

    #[track_caller]
    pub fn with_status(reason: impl Into<String>, status_code: u16) -> Self {
        Self {
            reason: reason.into(),
            status_code,
            context: None,
            location: Location::caller(),
        }
    }

    /// Attach context; consumes the value so the result is still immutable
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    #[track_caller]
    pub fn missing_message(context: ErrorContext) -> Self {
        Self::with_status(reasons::MISSING_MESSAGE, 400).with_context(context)
    }

    #[track_caller]
    pub fn invalid_email(context: ErrorContext) -> Self {
        Self::with_status(reasons::INVALID_EMAIL, 400).with_context(context)
    }

    #[track_caller]
    pub fn unsupported_content_type() -> Self {
        Self::with_status(reasons::UNSUPPORTED_CONTENT_TYPE, 400)
    }

    #[track_caller]
    pub fn no_bots_allowed() -> Self {
        Self::with_status(reasons::NO_BOTS_ALLOWED, 401)
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        self.context.as_ref()
    }

    /// Where the error was constructed
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl From<config::ConfigError> for ContactError {
    fn from(err: config::ConfigError) -> Self {
        ContactError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ContactError {
    fn from(err: serde_json::Error) -> Self {
        ContactError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ContactError {
    fn from(err: base64::DecodeError) -> Self {
        ContactError::Decode(err.to_string())
    }
}

impl From<serde_urlencoded::de::Error> for ContactError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        ContactError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ContactError {
    fn from(err: reqwest::Error) -> Self {
        ContactError::Delivery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status() {
        let err = HttpError::new("SOMETHING");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.reason(), "SOMETHING");
        assert!(err.context().is_none());
    }

    #[test]
    fn test_display_is_reason_token() {
        let err: ContactError = HttpError::no_bots_allowed().into();
        assert_eq!(err.to_string(), "NO_BOTS_ALLOWED");
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_unstructured_errors_map_to_500() {
        let err = ContactError::Delivery("relay unreachable".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "relay unreachable");
        assert!(err.as_http().is_none());
    }

    #[test]
    fn test_context_and_location() {
        let mut context = ErrorContext::new();
        context.insert("message".to_string(), String::new());
        let err = HttpError::missing_message(context);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.context().and_then(|c| c.get("message")).map(String::as_str), Some(""));
        assert!(err.location().file().ends_with("mod.rs"));
    }
}
