//! Contact Handler Binary
//!
//! `contact-handler` serves the contact endpoint over HTTP.
//! `contact-handler invoke` reads one proxy event as JSON from stdin and prints the
//! proxy response as JSON, for gateway-style invocation.

use anyhow::Context;
use contact_handler::{
    config::Config,
    contact::build_contact_handler,
    delivery::sender_from_config,
    event::ProxyEvent,
    observability::init_observability,
    server::{dispatch, start_server},
};
use tokio::io::AsyncReadExt;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::from_file_with_env(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    init_observability(&config.logging.level, &config.logging.format);
    info!("Configuration loaded and validated from {}", config_path);

    let sender = sender_from_config(&config.delivery)?;
    info!("Delivery initialized: {:?}", config.delivery.kind);

    let handler = build_contact_handler(&config, sender)?;

    if std::env::args().nth(1).as_deref() == Some("invoke") {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        let event: ProxyEvent = serde_json::from_str(&input).context("Invalid proxy event")?;

        let response = dispatch(&handler, event).await;
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let max_body_size = config.server.max_body_size_kb * 1024;
    info!("Body size limit set to {} KB", config.server.max_body_size_kb);

    start_server(&addr, handler, max_body_size)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
