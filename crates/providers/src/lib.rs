//! Upstream model clients for Candor.
//!
//! The generation and search providers implement the `candor_core`
//! `Generator` and `Searcher` traits. Provider selection comes from
//! configuration.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use candor_config::AppConfig;
use candor_core::error::ProviderError;

/// Build the configured provider.
///
/// The same client serves both generation and search; the search model is
/// configurable independently of the generation model.
pub fn from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("No API key configured".into()))?;

    let provider = match config.default_provider.as_str() {
        "openrouter" => OpenAiCompatProvider::openrouter(api_key)?,
        "openai" => OpenAiCompatProvider::openai(api_key)?,
        "ollama" => OpenAiCompatProvider::ollama(
            config.providers.get("ollama").and_then(|p| p.api_url.as_deref()),
        )?,
        name => {
            let provider_config = config.providers.get(name).ok_or_else(|| {
                ProviderError::NotConfigured(format!("Unknown provider: {name}"))
            })?;
            let url = provider_config.api_url.as_deref().ok_or_else(|| {
                ProviderError::NotConfigured(format!("Provider '{name}' has no api_url"))
            })?;
            OpenAiCompatProvider::new(name, url, api_key)?
        }
    };

    Ok(provider.with_search_model(config.retrieval.search_model.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candor_core::provider::Generator;

    #[test]
    fn from_config_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn from_config_builds_openrouter() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let provider = from_config(&config).unwrap();
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn unknown_provider_rejected() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            default_provider: "mystery".into(),
            ..AppConfig::default()
        };
        assert!(from_config(&config).is_err());
    }
}
