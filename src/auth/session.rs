//! Session store.
//!
//! Sessions hold the per-user OAuth state: the PKCE verifier while an
//! authorization is in flight, then the tokens and profile once the
//! exchange completes. The store surface is deliberately narrow:
//! `get`/`set`/`destroy` keyed by session id, so a different backend
//! (Redis, database) can slot in behind the same trait.
//!
//! [`MemorySessionStore`] is the bundled implementation: an LRU map
//! behind an async lock, bounding memory by evicting the least recently
//! used session.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::error::SessionError;

use super::oauth::UserProfile;

/// Default maximum number of concurrent sessions kept in memory.
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

// =============================================================================
// Session Data
// =============================================================================

/// Per-session OAuth state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    /// PKCE verifier, present only while an authorization is in flight
    pub code_verifier: Option<String>,

    /// CSRF state sent with the authorize request
    pub oauth_state: Option<String>,

    /// Access token from the last successful exchange
    pub access_token: Option<String>,

    /// Refresh token, when the provider granted offline access
    pub refresh_token: Option<String>,

    /// Cached user profile
    pub user: Option<UserProfile>,
}

impl SessionData {
    /// Whether this session holds a usable access token.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

// =============================================================================
// Session Store Trait
// =============================================================================

/// Narrow key-value interface over the session backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by id.
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError>;

    /// Create or replace a session.
    async fn set(&self, session_id: &str, data: SessionData) -> Result<(), SessionError>;

    /// Remove a session. Removing an unknown id is not an error.
    async fn destroy(&self, session_id: &str) -> Result<(), SessionError>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Bounded in-memory session store.
pub struct MemorySessionStore {
    sessions: Mutex<LruCache<String, SessionData>>,
}

impl MemorySessionStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    /// Create a store bounding the number of live sessions.
    ///
    /// A zero capacity is bumped to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether the store has no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn set(&self, session_id: &str, data: SessionData) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        sessions.put(session_id.to_string(), data);
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        sessions.pop(session_id);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
