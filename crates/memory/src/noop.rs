//! No-op store — disables memory entirely.

use async_trait::async_trait;

use candor_core::error::MemoryError;
use candor_core::memory::{MemoryQuery, MemoryRecord, MemoryStore};

/// A store that accepts and returns nothing.
pub struct NoopStore;

#[async_trait]
impl MemoryStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn create(&self, _record: MemoryRecord) -> Result<String, MemoryError> {
        Ok(String::new())
    }

    async fn get(&self, _id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        Ok(None)
    }

    async fn search(&self, _query: MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }
}
