//! Core library for `Singalong`.
//!
//! Resolves human-readable (group, project, path) triples into upstream
//! numeric identifiers, follows result pagination, caches successful
//! resolutions per credential, and fetches the requested HTML file. Every
//! failure is classified into [`error::GatewayError`]. This crate knows
//! nothing about HTTP routing or browser sessions.

pub mod cache;
pub mod client;
pub mod credential;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod link;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use credential::Credential;
pub use error::{ApiError, GatewayError};
pub use gateway::Gateway;

/// Numeric identifier of an upstream group.
pub type GroupId = u64;

/// Numeric identifier of an upstream project.
pub type ProjectId = u64;
