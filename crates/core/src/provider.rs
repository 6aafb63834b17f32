//! Provider traits — the abstractions over the upstream model endpoints.
//!
//! `Generator` streams raw SSE bytes from a generation model. It deliberately
//! does NOT decode or parse the event stream: the transform pipeline owns
//! framing, so the provider hands over exactly the byte chunks it read off
//! the socket.
//!
//! `Searcher` is the single-shot search-capable completion used for prompt
//! enrichment. It is treated as unreliable by its caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The conversation messages (post-enrichment)
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A stream of raw byte chunks from the upstream response body.
///
/// Chunk boundaries are arbitrary: a protocol line, or even a single
/// multi-byte character, may be split across chunks. A terminal `Err`
/// means the upstream closed abnormally.
pub type ByteStream =
    tokio::sync::mpsc::Receiver<std::result::Result<bytes::Bytes, ProviderError>>;

/// The upstream generation interface.
///
/// Implementations: OpenAI-compatible endpoints (OpenAI, OpenRouter, Ollama,
/// vLLM, ...). The pipeline calls `stream_bytes()` without knowing which
/// backend is in use.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Start a streaming generation and return the raw response bytes.
    async fn stream_bytes(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<ByteStream, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }

    /// List available models for this provider.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

/// The search interface consumed by prompt enrichment.
///
/// One request, one text response. Callers must assume it can time out,
/// error, or return junk; the retriever wraps it in a time budget and
/// swallows failures.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Issue a single search-backed completion for `query`.
    async fn search(&self, query: &str) -> std::result::Result<String, ProviderError>;
}
