//! Session gate.
//!
//! Handlers load a [`SessionContext`] from the request's cookie, make their
//! decisions on the plain [`Session`] value it carries, and commit it back
//! to the store together with the response. A fresh session (no cookie, an
//! unparseable cookie, or an id the store does not know) gets a new random
//! id and a `Set-Cookie` header.
//!
//! Committing an existing session writes back only the fields the request
//! changed, so a slow request cannot restore a credential that a concurrent
//! request on the same session discarded.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use singalong_core::Credential;
use singalong_session::{Session, SessionError, SessionId, SessionStore};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "singalong_session";

/// Route of the login form.
pub const LOGIN_PATH: &str = "/authenticate";

/// A session loaded for the duration of one request.
#[derive(Debug)]
pub struct SessionContext {
    id: SessionId,
    /// The session state handlers act on.
    pub session: Session,
    original: Session,
    is_new: bool,
    retired: Option<SessionId>,
}

impl SessionContext {
    /// Load the session named by the request's cookie, or start a new one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store fails.
    pub async fn load(
        store: &dyn SessionStore,
        headers: &HeaderMap,
    ) -> Result<Self, SessionError> {
        if let Some(id) = session_id_from(headers) {
            if let Some(session) = store.load(&id).await? {
                return Ok(Self {
                    id,
                    original: session.clone(),
                    session,
                    is_new: false,
                    retired: None,
                });
            }
            debug!("unknown session id presented, starting a new session");
        }

        Ok(Self {
            id: SessionId::generate(),
            session: Session::default(),
            original: Session::default(),
            is_new: true,
            retired: None,
        })
    }

    /// Move the session to a fresh id, dropping the old one on commit.
    ///
    /// Called when a credential is stored so a session id planted before
    /// login never becomes authenticated.
    pub fn rotate(&mut self) {
        let old = std::mem::replace(&mut self.id, SessionId::generate());
        if !self.is_new {
            self.retired = Some(old);
        }
        self.is_new = true;
    }

    /// Whether committing will set a new cookie.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Save the session and attach the cookie to `response` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Session`] if the store fails.
    pub async fn commit(
        self,
        state: &AppState,
        response: impl IntoResponse,
    ) -> Result<Response, AppError> {
        let Self {
            id,
            session,
            original,
            is_new,
            retired,
        } = self;

        if let Some(old) = &retired {
            state.sessions.remove(old).await?;
        }

        if is_new {
            state.sessions.save(&id, session).await?;
        } else {
            let edit = Box::new(move |stored: &mut Session| stored.apply_changes(&original, session));
            if !state.sessions.update(&id, edit).await? {
                debug!("session expired during the request, changes dropped");
            }
        }

        let mut response = response.into_response();
        if is_new {
            let cookie = session_cookie(&id, state.secure_cookies);
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => return Err(AppError::Session(format!("invalid cookie: {e}"))),
            }
        }
        Ok(response)
    }
}

/// Return the session credential, or stash `requested` for after login.
///
/// `None` means the caller must redirect to [`LOGIN_PATH`].
pub fn require_credential(session: &mut Session, requested: &str) -> Option<Credential> {
    match &session.credential {
        Some(credential) => Some(credential.clone()),
        None => {
            session.stash_target(requested);
            None
        }
    }
}

/// Reduce a redirect target to a same-origin path.
///
/// Anything that is not an absolute path (including protocol-relative
/// `//host` and backslash tricks) falls back to `/`.
#[must_use]
pub fn safe_target(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.contains('\\')
                && !t.chars().any(char::is_control) =>
        {
            t.to_owned()
        }
        _ => "/".to_owned(),
    }
}

fn session_id_from(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}

fn session_cookie(id: &SessionId, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
