//! Context retriever — one bounded search call, failures swallowed.
//!
//! Missing context must degrade gracefully rather than abort the
//! user-facing stream, so every failure mode (timeout, transport error,
//! empty response) collapses to `None` with a warning log. Nothing here
//! ever propagates an error to the pipeline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use candor_core::provider::Searcher;

/// Default time budget for one search call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a `Searcher` in a time budget and a swallow-all error policy.
pub struct ContextRetriever {
    searcher: Arc<dyn Searcher>,
    timeout: Duration,
}

impl ContextRetriever {
    pub fn new(searcher: Arc<dyn Searcher>) -> Self {
        Self {
            searcher,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retrieve context for `query`, or `None` on any failure.
    pub async fn retrieve(&self, query: &str) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.searcher.search(query)).await {
            Ok(Ok(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    warn!("search returned empty text, skipping enrichment");
                    None
                } else {
                    debug!(chars = trimmed.len(), "retrieved search context");
                    Some(trimmed.to_string())
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "search call failed, skipping enrichment");
                None
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "search call timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use candor_core::error::ProviderError;

    struct FixedSearcher(String);

    #[async_trait]
    impl Searcher for FixedSearcher {
        async fn search(&self, _query: &str) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSearcher;

    #[async_trait]
    impl Searcher for FailingSearcher {
        async fn search(&self, _query: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    struct SlowSearcher;

    #[async_trait]
    impl Searcher for SlowSearcher {
        async fn search(&self, _query: &str) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".into())
        }
    }

    #[tokio::test]
    async fn successful_search_returns_text() {
        let retriever = ContextRetriever::new(Arc::new(FixedSearcher("fresh facts".into())));
        assert_eq!(retriever.retrieve("query").await.as_deref(), Some("fresh facts"));
    }

    #[tokio::test]
    async fn failure_returns_none() {
        let retriever = ContextRetriever::new(Arc::new(FailingSearcher));
        assert!(retriever.retrieve("query").await.is_none());
    }

    #[tokio::test]
    async fn empty_response_returns_none() {
        let retriever = ContextRetriever::new(Arc::new(FixedSearcher("   ".into())));
        assert!(retriever.retrieve("query").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_returns_none() {
        let retriever = ContextRetriever::new(Arc::new(SlowSearcher))
            .with_timeout(Duration::from_secs(5));
        assert!(retriever.retrieve("query").await.is_none());
    }
}
