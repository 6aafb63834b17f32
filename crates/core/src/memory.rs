//! Memory trait — the conversational-memory collaborator.
//!
//! The proxy persists user and assistant turns per caller so later requests
//! can be audited or replayed. The store is an opaque collaborator: nothing
//! in its behavior affects the streaming core beyond accepting and returning
//! plain text keyed by user identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::identity::UserId;

/// What kind of record a memory entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A user turn
    UserTurn,
    /// An assistant turn (post-rewrite, as the client saw it)
    AssistantTurn,
    /// A free-form note stored via the API
    Note,
}

/// A single stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID for this record
    pub id: String,

    /// The owning user
    pub user_id: UserId,

    /// Record type
    pub kind: RecordKind,

    /// The text content
    pub content: String,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Create a new record with a fresh ID and timestamp.
    pub fn new(user_id: UserId, kind: RecordKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A query over stored records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// Restrict to this user
    pub user_id: UserId,

    /// Case-insensitive substring to match in content (empty = match all)
    #[serde(default)]
    pub text: String,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// The memory store trait.
///
/// Implementations: in-memory (default), no-op.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    /// Store a record, returning its ID.
    async fn create(&self, record: MemoryRecord) -> std::result::Result<String, MemoryError>;

    /// Get a record by ID.
    async fn get(&self, id: &str) -> std::result::Result<Option<MemoryRecord>, MemoryError>;

    /// Search records for a user.
    async fn search(
        &self,
        query: MemoryQuery,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Total record count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;
}
