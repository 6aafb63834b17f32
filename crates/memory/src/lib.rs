//! Memory store implementations for Candor.

pub mod in_memory;
pub mod noop;

pub use in_memory::InMemoryStore;
pub use noop::NoopStore;

use std::sync::Arc;

use candor_config::MemoryConfig;
use candor_core::memory::MemoryStore;

/// Build the configured memory store.
///
/// Unknown backend names fall back to the in-memory store with a warning
/// rather than failing startup.
pub fn from_config(config: &MemoryConfig) -> Arc<dyn MemoryStore> {
    match config.backend.as_str() {
        "none" => Arc::new(NoopStore),
        "in_memory" => Arc::new(InMemoryStore::new()),
        other => {
            tracing::warn!(backend = %other, "Unknown memory backend, using in_memory");
            Arc::new(InMemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_selection() {
        let mut config = MemoryConfig::default();
        assert_eq!(from_config(&config).name(), "in_memory");

        config.backend = "none".into();
        assert_eq!(from_config(&config).name(), "none");

        config.backend = "galactic".into();
        assert_eq!(from_config(&config).name(), "in_memory");
    }
}
