//! Configuration loading, validation, and management for Candor.
//!
//! Loads configuration from `~/.candor/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.candor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default generation model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Context-retrieval (enrichment) configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Stream-rewrite configuration
    #[serde(default)]
    pub rewrite: RewriteSettings,

    /// Memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("retrieval", &self.retrieval)
            .field("rewrite", &self.rewrite)
            .field("memory", &self.memory)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Accepted bearer tokens mapped to user IDs. Empty = open access
    /// (local single-user mode).
    #[serde(default)]
    pub bearer_tokens: HashMap<String, String>,
}

fn default_port() -> u16 {
    48100
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            bearer_tokens: HashMap::new(),
        }
    }
}

/// Context-retrieval settings for prompt enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Whether enrichment runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Time budget for one search call, in seconds
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,

    /// Search-capable model used for retrieval
    #[serde(default = "default_search_model")]
    pub search_model: String,
}

fn default_retrieval_timeout() -> u64 {
    10
}
fn default_search_model() -> String {
    "perplexity/sonar".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_retrieval_timeout(),
            search_model: default_search_model(),
        }
    }
}

/// Stream-rewrite settings.
///
/// Aggressiveness out of range is clamped by the rewriter, never rejected.
/// The probability constants are empirically tuned defaults kept
/// configurable on purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteSettings {
    /// 0 = never rewrite, 10 = near-always when flagged
    #[serde(default = "default_aggressiveness")]
    pub aggressiveness: i64,

    /// Secondary probability of appending a hedge phrase after softening
    #[serde(default = "default_inject_probability")]
    pub inject_probability: f64,

    /// Divisor for the unflagged challenge probability
    #[serde(default = "default_challenge_divisor")]
    pub challenge_divisor: f64,
}

fn default_aggressiveness() -> i64 {
    5
}
fn default_inject_probability() -> f64 {
    0.3
}
fn default_challenge_divisor() -> f64 {
    20.0
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            aggressiveness: default_aggressiveness(),
            inject_probability: default_inject_probability(),
            challenge_divisor: default_challenge_divisor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Backend: "in_memory" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Auto-save user and assistant turns
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

fn default_memory_backend() -> String {
    "in_memory".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            auto_save: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.candor/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `CANDOR_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("CANDOR_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("CANDOR_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("CANDOR_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".candor")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.timeout_secs must be at least 1".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rewrite.inject_probability) {
            return Err(ConfigError::ValidationError(
                "rewrite.inject_probability must be between 0.0 and 1.0".into(),
            ));
        }

        if self.rewrite.challenge_divisor <= 0.0 {
            return Err(ConfigError::ValidationError(
                "rewrite.challenge_divisor must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            retrieval: RetrievalConfig::default(),
            rewrite: RewriteSettings::default(),
            memory: MemoryConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.gateway.port, 48100);
        assert!(config.retrieval.enabled);
        assert_eq!(config.rewrite.aggressiveness, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.rewrite.aggressiveness, config.rewrite.aggressiveness);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_inject_probability_rejected() {
        let mut config = AppConfig::default();
        config.rewrite.inject_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_aggressiveness_is_not_rejected() {
        // Clamping happens in the rewriter; config only validates the
        // probability constants.
        let mut config = AppConfig::default();
        config.rewrite.aggressiveness = 99;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_provider, "openrouter");
    }

    #[test]
    fn config_file_parsing() {
        let toml_str = r#"
default_provider = "openai"
default_model = "gpt-4o"

[gateway]
port = 9000

[gateway.bearer_tokens]
"tok-abc" = "alice"

[retrieval]
timeout_secs = 4
search_model = "openai/gpt-4o:online"

[rewrite]
aggressiveness = 9
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bearer_tokens.get("tok-abc").unwrap(), "alice");
        assert_eq!(config.retrieval.timeout_secs, 4);
        assert_eq!(config.rewrite.aggressiveness, 9);
        // Unspecified constants keep their defaults.
        assert!((config.rewrite.inject_probability - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openrouter"));
        assert!(toml_str.contains("48100"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = \"gpt-4o-mini\"\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
    }
}
