//! Submission validation

use super::ContactMessage;
use crate::error::{HttpError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

/// Addresses always rejected, regardless of configuration
pub const DEFAULT_BLOCKED_EMAILS: &[&str] = &["sample@email.tst"];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern is valid")
    })
}

/// Syntactic email check (RFC 5322 simplified)
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || !email_re().is_match(email) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.len() > 64 || domain.len() > 255 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((_, tld)) => tld.len() >= 2 && !tld.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Exact-match set of disallowed submitter addresses
#[derive(Debug, Clone)]
pub struct Blocklist {
    emails: HashSet<String>,
}

impl Blocklist {
    pub fn with_extra(extra: &[String]) -> Self {
        let emails = DEFAULT_BLOCKED_EMAILS
            .iter()
            .map(|e| e.to_string())
            .chain(extra.iter().cloned())
            .collect();
        Self { emails }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactValidator {
    blocklist: Blocklist,
}

impl ContactValidator {
    pub fn new(blocklist: Blocklist) -> Self {
        Self { blocklist }
    }

    pub fn check_message(&self, message: &ContactMessage) -> Result<()> {
        if message.message.is_empty() {
            warn!("Rejected submission without message");
            return Err(HttpError::missing_message(message.to_context()).into());
        }
        Ok(())
    }

    pub fn check_email(&self, message: &ContactMessage) -> Result<()> {
        if !is_valid_email(&message.email) || self.blocklist.contains(&message.email) {
            warn!("Rejected submission with invalid or blocked email");
            return Err(HttpError::invalid_email(message.to_context()).into());
        }
        Ok(())
    }

    /// Message presence first, then email.
    pub fn validate(&self, message: ContactMessage) -> Result<ContactMessage> {
        self.check_message(&message)?;
        self.check_email(&message)?;
        Ok(message)
    }
}
