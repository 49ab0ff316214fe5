//! Configuration management for the contact handler

use crate::contact::LocaleTable;
use crate::error::{ContactError, Result};
use crate::middleware::{AllowOrigin, CorsOptions};
use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub mod loader;
pub mod validation;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub contact: ContactConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Contact endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Destination mailbox; also used as the sender address
    pub contact_email: String,

    /// Origins allowed verbatim (compared lower-cased)
    #[serde(default)]
    pub allow_origins: Vec<String>,

    /// Origins allowed by regular expression
    #[serde(default)]
    pub allow_origin_patterns: Vec<String>,

    #[serde(default = "default_allow_methods")]
    pub allow_methods: Vec<String>,

    /// Advertised request headers; unset uses the CORS defaults
    #[serde(default)]
    pub allow_headers: Option<Vec<String>>,

    /// Reject crawler user agents
    #[serde(default = "default_block_bots")]
    pub block_bots: bool,

    /// Additional user agent patterns treated as bots
    #[serde(default)]
    pub bot_patterns: Vec<String>,

    /// Submitter addresses to reject, on top of the built-in ones
    #[serde(default)]
    pub blocked_emails: Vec<String>,
}

impl ContactConfig {
    /// CORS options for the configured origins and methods
    pub fn cors_options(&self) -> Result<CorsOptions> {
        let mut origins: Vec<AllowOrigin> = self
            .allow_origins
            .iter()
            .map(|origin| AllowOrigin::exact(origin.to_lowercase()))
            .collect();

        for pattern in &self.allow_origin_patterns {
            let regex = Regex::new(pattern).map_err(|e| {
                ContactError::Config(format!("Invalid origin pattern '{}': {}", pattern, e))
            })?;
            origins.push(AllowOrigin::Pattern(regex));
        }

        let options = CorsOptions::new(AllowOrigin::List(origins)).with_methods(self.allow_methods.clone());
        Ok(match &self.allow_headers {
            Some(headers) => options.with_headers(headers.clone()),
            None => options,
        })
    }
}

/// Subject phrases per language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "default_lang")]
    pub default: String,

    #[serde(default = "default_subjects")]
    pub subjects: HashMap<String, String>,
}

impl LocaleConfig {
    pub fn table(&self) -> LocaleTable {
        LocaleTable::new(self.default.clone(), self.subjects.clone())
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: default_lang(),
            subjects: default_subjects(),
        }
    }
}

/// Mail transport selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    #[default]
    Log,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub kind: DeliveryKind,

    /// Relay URL for `http` delivery
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the relay (optional, secured)
    #[serde(default, serialize_with = "serialize_optional_secret", deserialize_with = "deserialize_optional_secret")]
    pub api_token: Option<Secret<String>>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            kind: DeliveryKind::default(),
            endpoint: None,
            api_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Server host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size")]
    pub max_body_size_kb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            host: default_server_host(),
            max_body_size_kb: default_max_body_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_allow_methods() -> Vec<String> { vec!["OPTIONS".to_string(), "POST".to_string()] }
fn default_block_bots() -> bool { true }
fn default_lang() -> String { crate::contact::locale::DEFAULT_LANG.to_string() }
fn default_subjects() -> HashMap<String, String> { crate::contact::locale::builtin_subjects() }
fn default_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }
fn default_server_port() -> u16 { 8080 }
fn default_server_host() -> String { "0.0.0.0".to_string() }
fn default_max_body_size() -> usize { 64 }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = loader::load_config(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = loader::load_config_with_env(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Validate this configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self {
            contact: ContactConfig {
                contact_email: std::env::var("CONTACT_EMAIL").unwrap_or_default(),
                allow_origins: Vec::new(),
                allow_origin_patterns: Vec::new(),
                allow_methods: default_allow_methods(),
                allow_headers: None,
                block_bots: default_block_bots(),
                bot_patterns: Vec::new(),
                blocked_emails: Vec::new(),
            },
            locale: LocaleConfig::default(),
            delivery: DeliveryConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Custom serializer for Option<Secret<String>>
fn serialize_optional_secret<S>(secret: &Option<Secret<String>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Custom deserializer for Option<Secret<String>>
fn deserialize_optional_secret<'de, D>(deserializer: D) -> std::result::Result<Option<Secret<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.map(Secret::new))
}
