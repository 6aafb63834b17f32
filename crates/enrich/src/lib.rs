//! # Candor Enrich
//!
//! The pre-generation enrichment step: decide whether the latest user turn
//! warrants a search, run the bounded retrieval if so, and inject whatever
//! came back ahead of the final user message. Decisions are made once per
//! request from the latest user turn only — no multi-turn planning.

pub mod enhance;
pub mod retriever;
pub mod trigger;

pub use enhance::enhance;
pub use retriever::ContextRetriever;
pub use trigger::should_retrieve;

use candor_core::message::{Message, Role};
use tracing::debug;

/// Run the full enrichment step over a conversation.
///
/// Returns the message list to send upstream. Identical to the input when
/// retrieval is skipped or fails.
pub async fn prepare(messages: &[Message], retriever: &ContextRetriever) -> Vec<Message> {
    let Some(last_user) = messages.iter().rev().find(|m| m.role == Role::User) else {
        return messages.to_vec();
    };

    if !should_retrieve(&last_user.content) {
        debug!("no recency trigger, skipping retrieval");
        return messages.to_vec();
    }

    let context = retriever.retrieve(&last_user.content).await;
    enhance(messages, context.as_deref())
}
