//! Health check: `GET /`.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health))
        .route("/favicon.ico", get(no_favicon))
}

async fn health() -> &'static str {
    "OK"
}

/// Keeps browsers' favicon requests away from the content handler.
async fn no_favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}
