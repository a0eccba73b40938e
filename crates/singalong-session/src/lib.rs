//! Session storage for `Singalong`.
//!
//! A browser session holds at most two things: the target the user asked
//! for before being sent to the login form, and the bearer credential they
//! supplied. This crate defines the [`Session`] value, the [`SessionStore`]
//! trait sessions are loaded from and saved to, and [`MemorySessionStore`],
//! the process-scoped implementation.
//!
//! Sessions are plain values: the front door loads one, passes it through
//! the gate logic, and saves it back. Nothing here talks to the upstream API.

mod error;
mod memory;

use std::fmt;
use std::time::Duration;

use singalong_core::Credential;

pub use error::SessionError;
pub use memory::MemorySessionStore;

/// Idle time after which a session is forgotten.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Edit applied to a stored session by [`SessionStore::update`].
pub type SessionUpdate = Box<dyn FnOnce(&mut Session) + Send>;

/// Opaque session identifier carried in the session cookie.
///
/// Always a UUID v4 in hyphenated form; anything else a browser sends is
/// rejected by [`SessionId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().hyphenated().to_string())
    }

    /// Parse an id received from a cookie.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw.trim())
            .ok()
            .map(|id| Self(id.hyphenated().to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State kept for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Where to send the user once they have logged in.
    pub pending_target: Option<String>,
    /// The user's bearer credential, once supplied.
    pub credential: Option<Credential>,
}

impl Session {
    /// Whether a credential is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Remember `target` for after login.
    pub fn stash_target(&mut self, target: impl Into<String>) {
        self.pending_target = Some(target.into());
    }

    /// Store `credential` and hand back the stashed target, if any.
    pub fn login(&mut self, credential: Credential) -> Option<String> {
        self.credential = Some(credential);
        self.pending_target.take()
    }

    /// Forget the stored credential. Returns whether one was present.
    pub fn discard_credential(&mut self) -> bool {
        self.credential.take().is_some()
    }

    /// Copy into `self` the fields that differ between `original` and
    /// `updated`, leaving the others as they are.
    ///
    /// `self` is the currently stored state; `original` and `updated` are one
    /// request's view before and after it ran.
    pub fn apply_changes(&mut self, original: &Session, updated: Session) {
        let Session {
            pending_target,
            credential,
        } = updated;
        if pending_target != original.pending_target {
            self.pending_target = pending_target;
        }
        if credential != original.credential {
            self.credential = credential;
        }
    }
}

/// A pluggable store of browser sessions.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load a session. Returns `Ok(None)` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Read`] if the backend fails.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionError>;

    /// Store a session, replacing any previous state for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Write`] if the backend fails.
    async fn save(&self, id: &SessionId, session: Session) -> Result<(), SessionError>;

    /// Apply `edit` to a stored session in one step, so concurrent requests
    /// on the same session do not overwrite each other's changes.
    ///
    /// Returns `false`, creating nothing, if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Write`] if the backend fails.
    async fn update(&self, id: &SessionId, edit: SessionUpdate) -> Result<bool, SessionError>;

    /// Drop a session. Removing an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Delete`] if the backend fails.
    async fn remove(&self, id: &SessionId) -> Result<(), SessionError>;
}
