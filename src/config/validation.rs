//! Configuration validation

use super::*;
use crate::contact::is_valid_email;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_contact_config(&config.contact)?;
    validate_locale_config(&config.locale)?;
    validate_delivery_config(&config.delivery)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validate contact endpoint configuration
fn validate_contact_config(config: &ContactConfig) -> Result<()> {
    if config.contact_email.is_empty() {
        return Err(ContactError::Config(
            "Contact email is required".to_string()
        ));
    }

    if !is_valid_email(&config.contact_email) {
        return Err(ContactError::Config(
            format!("Contact email '{}' is not a valid address", config.contact_email)
        ));
    }

    if config.allow_origins.is_empty() && config.allow_origin_patterns.is_empty() {
        return Err(ContactError::Config(
            "At least one allowed origin or origin pattern is required".to_string()
        ));
    }

    if config.allow_origins.iter().any(|origin| origin.trim().is_empty()) {
        return Err(ContactError::Config(
            "Allowed origins cannot be empty".to_string()
        ));
    }

    // Compiles every origin pattern
    config.cors_options()?;

    for pattern in &config.bot_patterns {
        Regex::new(pattern).map_err(|e| {
            ContactError::Config(format!("Invalid bot pattern '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

/// Validate locale configuration
fn validate_locale_config(config: &LocaleConfig) -> Result<()> {
    if !config.subjects.contains_key(&config.default) {
        return Err(ContactError::Config(
            format!("Default locale '{}' has no subject", config.default)
        ));
    }

    if let Some((lang, _)) = config.subjects.iter().find(|(_, subject)| subject.trim().is_empty()) {
        return Err(ContactError::Config(
            format!("Subject for locale '{}' cannot be empty", lang)
        ));
    }

    Ok(())
}

/// Validate delivery configuration
fn validate_delivery_config(config: &DeliveryConfig) -> Result<()> {
    if config.kind == DeliveryKind::Http {
        let endpoint = config.endpoint.as_deref().unwrap_or_default();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ContactError::Config(
                "HTTP delivery endpoint must start with http:// or https://".to_string()
            ));
        }
    }

    if config.timeout_secs == 0 {
        return Err(ContactError::Config(
            "Delivery timeout must be greater than 0".to_string()
        ));
    }

    if config.timeout_secs > 300 {
        return Err(ContactError::Config(
            "Delivery timeout too large (max: 300 seconds)".to_string()
        ));
    }

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(ContactError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    if config.host.is_empty() {
        return Err(ContactError::Config(
            "Server host cannot be empty".to_string()
        ));
    }

    if config.max_body_size_kb == 0 {
        return Err(ContactError::Config(
            "Max body size must be greater than 0".to_string()
        ));
    }

    Ok(())
}
