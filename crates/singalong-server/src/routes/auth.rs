//! Login routes: `/authenticate`.
//!
//! `GET` renders the token form. `POST` stores the submitted token in the
//! session (under a fresh session id) and redirects back to the page the
//! user originally asked for. The token is not checked here; the upstream
//! judges it on the next content request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use singalong_core::Credential;
use tracing::info;

use crate::error::AppError;
use crate::html;
use crate::session::{self, SessionContext, LOGIN_PATH};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(LOGIN_PATH, get(login_form).post(login))
}

/// Submitted login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub token: Option<String>,
    /// Target carried in the form's hidden field.
    pub project: Option<String>,
}

/// `GET /authenticate`
async fn login_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let ctx = SessionContext::load(state.sessions.as_ref(), &headers).await?;
    let target = session::safe_target(ctx.session.pending_target.as_deref());
    let page = Html(html::login_form(&target));
    ctx.commit(&state, page).await
}

/// `POST /authenticate`
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut ctx = SessionContext::load(state.sessions.as_ref(), &headers).await?;

    let credential = form
        .token
        .map(Credential::new)
        .filter(|c| !c.is_blank());

    let Some(credential) = credential else {
        let target = session::safe_target(
            ctx.session
                .pending_target
                .as_deref()
                .or(form.project.as_deref()),
        );
        let page = Html(html::login_form(&target));
        return ctx.commit(&state, page).await;
    };

    ctx.rotate();
    let pending = ctx.session.login(credential);
    let target = session::safe_target(pending.as_deref().or(form.project.as_deref()));

    info!(target_path = %target, "credential stored in session");
    ctx.commit(&state, Redirect::to(&target)).await
}
