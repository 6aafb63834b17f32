//! Caller identity — resolving a request credential to a user.
//!
//! Authentication is a collaborator, not part of the streaming core. The
//! gateway resolves each caller to a `UserId` before the pipeline runs;
//! everything downstream only sees the identifier.

use serde::{Deserialize, Serialize};

/// An opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn anonymous() -> Self {
        Self("anonymous".into())
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves a bearer credential to a user identity.
pub trait Authenticator: Send + Sync {
    /// Resolve the credential, or `None` when it is unknown.
    fn resolve(&self, bearer_token: &str) -> Option<UserId>;

    /// Whether unauthenticated callers are admitted (local single-user mode).
    fn allows_anonymous(&self) -> bool {
        false
    }
}
