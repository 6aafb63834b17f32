//! # Candor Core
//!
//! Domain types, traits, and error definitions for the Candor streaming proxy.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod identity;
pub mod memory;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, RetrievalError, StreamError};
pub use identity::{Authenticator, UserId};
pub use memory::{MemoryQuery, MemoryRecord, MemoryStore, RecordKind};
pub use message::{Message, Role};
pub use provider::{ByteStream, GenerationRequest, Generator, Searcher};
