//! `candor status` — Show configuration status.

use candor_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Candor Status");
    println!("=============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Provider:       {}", config.default_provider);
    println!("  Model:          {}", config.default_model);
    println!("  Temperature:    {}", config.default_temperature);
    println!("  Gateway:        {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Retrieval:      {} (model: {}, timeout: {}s)",
        if config.retrieval.enabled { "enabled" } else { "disabled" },
        config.retrieval.search_model,
        config.retrieval.timeout_secs
    );
    println!("  Aggressiveness: {}", config.rewrite.aggressiveness);
    println!("  Memory:         {}", config.memory.backend);
    println!(
        "  API key:        {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `candor onboard` first");
    }

    // Ping a running gateway, if any.
    let url = format!("http://{}:{}/health", config.gateway.host, config.gateway.port);
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(2))
        .build()?;
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            println!("  Gateway running at {url}");
        }
        _ => println!("  Gateway not running — start it with `candor serve`"),
    }

    Ok(())
}
