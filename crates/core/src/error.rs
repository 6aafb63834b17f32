//! Error types for the Candor domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Candor operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Stream transform errors ---
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the context-retrieval step.
///
/// These are recovered locally: a failed retrieval degrades to
/// no-enrichment and is never surfaced to the client.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Search call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Search call failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Search returned an unusable response: {0}")]
    Malformed(String),
}

/// Failures inside the stream transform pipeline.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// The generation source errored or closed abnormally. Surfaced to the
    /// client as a terminal stream error — never silently truncated.
    #[error("Upstream stream failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Downstream consumer went away")]
    DownstreamClosed,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}
