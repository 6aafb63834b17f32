//! In-memory store — the default backend for local sessions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use candor_core::error::MemoryError;
use candor_core::memory::{MemoryQuery, MemoryRecord, MemoryStore};

/// Stores records in a Vec behind an async RwLock.
///
/// Records live for the lifetime of the process. Suitable for local
/// single-user sessions where persistence isn't needed.
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create(&self, record: MemoryRecord) -> Result<String, MemoryError> {
        let id = record.id.clone();
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        let needle = query.text.to_lowercase();

        let mut results: Vec<MemoryRecord> = records
            .iter()
            .filter(|r| r.user_id == query.user_id)
            .filter(|r| needle.is_empty() || r.content.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        // Newest first
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(query.limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candor_core::identity::UserId;
    use candor_core::memory::RecordKind;

    fn record(user: &str, content: &str) -> MemoryRecord {
        MemoryRecord::new(UserId::from(user), RecordKind::UserTurn, content)
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = InMemoryStore::new();
        let id = store.create(record("u1", "what is the weather")).await.unwrap();
        assert!(!id.is_empty());

        let found = store.get(&id).await.unwrap();
        assert_eq!(found.unwrap().content, "what is the weather");
    }

    #[tokio::test]
    async fn search_scoped_to_user() {
        let store = InMemoryStore::new();
        store.create(record("u1", "rust borrow checker")).await.unwrap();
        store.create(record("u2", "rust lifetimes")).await.unwrap();

        let results = store
            .search(MemoryQuery {
                user_id: UserId::from("u1"),
                text: "rust".into(),
                limit: 10,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("borrow"));
    }

    #[tokio::test]
    async fn search_empty_text_matches_all() {
        let store = InMemoryStore::new();
        store.create(record("u1", "first")).await.unwrap();
        store.create(record("u1", "second")).await.unwrap();

        let results = store
            .search(MemoryQuery {
                user_id: UserId::from("u1"),
                text: String::new(),
                limit: 10,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.create(record("u1", &format!("note {i}"))).await.unwrap();
        }

        let results = store
            .search(MemoryQuery {
                user_id: UserId::from("u1"),
                text: "note".into(),
                limit: 3,
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn count_across_users() {
        let store = InMemoryStore::new();
        store.create(record("u1", "a")).await.unwrap();
        store.create(record("u2", "b")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
