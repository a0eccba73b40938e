//! `Singalong` HTTP server.
//!
//! Wires the resolution core and the session store into an Axum router with
//! three routes: a health check at `/`, the login form at `/authenticate`,
//! and the content handler at `/{project}` (optionally followed by a path).

pub mod config;
pub mod error;
pub mod html;
pub mod routes;
pub mod session;
pub mod state;
