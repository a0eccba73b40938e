//! In-memory session store.
//!
//! Sessions live in a `BTreeMap` behind a `RwLock` and are lost when the
//! process exits. A session that has not been saved or updated for the idle
//! TTL is treated as gone and pruned on the next save.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{DEFAULT_IDLE_TTL, Session, SessionError, SessionId, SessionStore, SessionUpdate};

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }
}

/// Process-scoped [`SessionStore`] with idle expiry.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<BTreeMap<SessionId, Entry>>>,
    idle_ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }
}

impl MemorySessionStore {
    /// Create an empty store with [`DEFAULT_IDLE_TTL`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that forgets sessions idle for `idle_ttl`.
    #[must_use]
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            idle_ttl,
        }
    }

    /// The configured idle TTL.
    #[must_use]
    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|entry| !entry.is_expired(self.idle_ttl))
            .count()
    }

    /// Whether the store holds no live session.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of entries held, expired ones included.
    #[cfg(test)]
    async fn held(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|entry| !entry.is_expired(self.idle_ttl))
            .map(|entry| entry.session.clone()))
    }

    async fn save(&self, id: &SessionId, session: Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.idle_ttl));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "expired sessions pruned");
        }
        sessions.insert(
            id.clone(),
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
        Ok(())
    }

    async fn update(&self, id: &SessionId, edit: SessionUpdate) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(entry) if !entry.is_expired(self.idle_ttl) => {
                edit(&mut entry.session);
                entry.last_seen = Instant::now();
                Ok(true)
            }
            Some(_) => {
                sessions.remove(id);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            debug!(session = %id, "session removed");
        }
        Ok(())
    }
}
