//! HTTP error types for `Singalong` server.
//!
//! Maps [`GatewayError`] and [`SessionError`] into HTML responses. Domain
//! errors are shown to the user inline with their literal message;
//! everything else gets a generic body and is logged.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use singalong_core::GatewayError;
use singalong_session::SessionError;

use crate::html;

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The upstream rejected the session's credential.
    #[error("invalid credential")]
    InvalidCredential { token_help_url: String },

    /// The configured group does not exist upstream.
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// No project with this name in the group.
    #[error("unknown project '{0}'")]
    UnknownProject(String),

    /// The project has no such file.
    #[error("missing file '{0}.html'")]
    FileMissing(String),

    /// Timeout, transport failure or unexpected upstream status.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(String),
}

impl AppError {
    /// Translate a core error, filling in the token help link.
    #[must_use]
    pub fn from_gateway(err: GatewayError, token_help_url: &str) -> Self {
        match err {
            GatewayError::InvalidCredential => Self::InvalidCredential {
                token_help_url: token_help_url.to_owned(),
            },
            GatewayError::UnknownGroup { group } => Self::UnknownGroup(group),
            GatewayError::UnknownProject { project } => Self::UnknownProject(project),
            GatewayError::FileMissing { path, .. } => Self::FileMissing(path),
            GatewayError::Upstream(inner) => Self::Upstream(inner.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::InvalidCredential { token_help_url } => (
                StatusCode::UNAUTHORIZED,
                html::invalid_credential(&token_help_url),
            ),
            Self::UnknownGroup(group) => {
                tracing::error!(group = %group, "configured group does not exist upstream");
                (StatusCode::INTERNAL_SERVER_ERROR, html::unknown_group(&group))
            }
            Self::UnknownProject(project) => {
                (StatusCode::NOT_FOUND, html::unknown_project(&project))
            }
            Self::FileMissing(path) => (StatusCode::NOT_FOUND, html::file_missing(&path)),
            Self::Upstream(msg) => {
                tracing::warn!(error = %msg, "upstream unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    html::UPSTREAM_UNAVAILABLE.to_owned(),
                )
            }
            Self::Session(msg) => {
                tracing::error!(error = %msg, "session store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        (status, Html(body)).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::Session(err.to_string())
    }
}
