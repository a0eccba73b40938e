//! Content routes: `/{project}` and `/{project}/{*path}`.
//!
//! Requests without a session credential are sent to the login form with
//! their target remembered. Otherwise the project is resolved in the
//! configured group and `{path}.html` (default: `{project}.html`) is served
//! verbatim. A credential the upstream rejects is dropped from the session
//! so the next request asks for a new one.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Uri};
use axum::response::{Html, Redirect, Response};
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use crate::error::AppError;
use crate::session::{self, SessionContext, LOGIN_PATH};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{project}", get(project_page))
        .route("/{project}/{*path}", get(project_file))
}

/// `GET /{project}`: serve `{project}.html`.
async fn project_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Path(project): Path<String>,
) -> Result<Response, AppError> {
    serve(&state, &headers, &uri, &project, None).await
}

/// `GET /{project}/{*path}`: serve `{path}.html`.
async fn project_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Path((project, path)): Path<(String, String)>,
) -> Result<Response, AppError> {
    serve(&state, &headers, &uri, &project, Some(path.trim_matches('/'))).await
}

async fn serve(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
    project: &str,
    path: Option<&str>,
) -> Result<Response, AppError> {
    let mut ctx = SessionContext::load(state.sessions.as_ref(), headers).await?;

    let requested = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string);

    let Some(credential) = session::require_credential(&mut ctx.session, &requested) else {
        info!(requested = %requested, "no credential in session, redirecting to login");
        return ctx.commit(state, Redirect::to(LOGIN_PATH)).await;
    };

    match state
        .gateway
        .resolve_and_fetch(&state.group, project, path, &credential)
        .await
    {
        Ok(body) => ctx.commit(state, Html(body)).await,
        Err(err) => {
            if err.invalidates_credential() && ctx.session.discard_credential() {
                warn!(project = %project, "credential rejected upstream, discarded from session");
            }
            let app_err = AppError::from_gateway(err, &state.token_help_url);
            ctx.commit(state, app_err).await
        }
    }
}
