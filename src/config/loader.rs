//! Configuration loader with environment variable support

use super::Config;
use crate::error::Result;
use config::{Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `CONTACT_HANDLER__CONTACT__CONTACT_EMAIL`
pub const ENV_PREFIX: &str = "CONTACT_HANDLER";

/// Keys whose environment value is a comma-separated list.
/// Regex lists (`allow_origin_patterns`, `bot_patterns`) are file-only since patterns may contain commas.
const ENV_LIST_KEYS: &[&str] = &[
    "contact.allow_origins",
    "contact.allow_methods",
    "contact.allow_headers",
    "contact.blocked_emails",
];

fn env_source() -> Environment {
    ENV_LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Load configuration from a TOML file with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(env_source())
        .build()?;

    Ok(config.try_deserialize()?)
}
