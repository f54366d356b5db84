//! Session identity shared by every watcher.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity of one page visit: the collector-issued (or locally generated)
/// session id and the URL of the page that opened it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    id: String,
    website_url: String,
}

impl SessionContext {
    /// Build a session. The id must be non-empty.
    pub fn new(
        id: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SessionError::EmptyId);
        }
        Ok(Self {
            id,
            website_url: website_url.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn website_url(&self) -> &str {
        &self.website_url
    }
}

/// Session context handed to each watcher at activation.
pub type SharedSession = Arc<SessionContext>;

/// Generate an offline session id.
pub fn local_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Session construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    EmptyId,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::EmptyId => write!(f, "session id is empty"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_id() {
        assert_eq!(
            SessionContext::new("", "https://a.example"),
            Err(SessionError::EmptyId)
        );
        assert_eq!(
            SessionContext::new("   ", "https://a.example"),
            Err(SessionError::EmptyId)
        );
    }

    #[test]
    fn test_accessors() {
        let session = SessionContext::new("abc123", "https://a.example/form").unwrap();
        assert_eq!(session.id(), "abc123");
        assert_eq!(session.website_url(), "https://a.example/form");
    }

    #[test]
    fn test_local_ids_are_unique() {
        let a = local_session_id();
        let b = local_session_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
