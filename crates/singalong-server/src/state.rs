//! Shared application state for `Singalong` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;

use singalong_core::Gateway;
use singalong_session::SessionStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Resolution core (owns the resolution cache).
    pub gateway: Gateway,
    /// Browser session store.
    pub sessions: Arc<dyn SessionStore>,
    /// Upstream group every request is resolved against.
    pub group: String,
    /// Token creation page linked from the invalid-credential message.
    pub token_help_url: String,
    /// Whether the session cookie carries the `Secure` attribute.
    pub secure_cookies: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}
