//! `candor serve` — Start the proxy gateway.

use candor_config::AppConfig;
use tracing::warn;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    if !config.has_api_key() {
        warn!("No API key configured — set CANDOR_API_KEY or edit config.toml");
    }

    candor_gateway::serve(config).await?;

    Ok(())
}
