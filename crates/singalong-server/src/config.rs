//! Server configuration for `Singalong`.
//!
//! Parsed from the command line with `clap`; every option can also be set
//! through a `SINGALONG_*` environment variable.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use singalong_core::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use singalong_session::DEFAULT_IDLE_TTL;

/// Where users are sent to create a personal access token.
pub const DEFAULT_TOKEN_HELP_URL: &str = "https://gitlab.com/-/profile/personal_access_tokens";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Serves HTML pages from GitLab.
///
/// GROUP is the name of the GitLab group the served projects belong to.
///
/// ```text
/// $ singalong PNCKS
/// ```
#[derive(Debug, Clone, Parser)]
#[command(name = "singalong", version, verbatim_doc_comment)]
pub struct Cli {
    /// Group the served projects belong to.
    #[arg(env = "SINGALONG_GROUP")]
    pub group: String,

    /// Development mode: loopback bind, human-readable logs, no `Secure` cookie.
    #[arg(long, env = "SINGALONG_DEVELOPMENT")]
    pub development: bool,

    /// Address to listen on (overrides `PORT`).
    #[arg(long, env = "SINGALONG_BIND_ADDR")]
    pub bind_addr: Option<SocketAddr>,

    /// Base URL of the upstream REST API.
    #[arg(long, env = "SINGALONG_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Deadline for each upstream call, in seconds.
    #[arg(long, env = "SINGALONG_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Seconds a browser session may sit idle before it is forgotten.
    #[arg(long, env = "SINGALONG_SESSION_TTL_SECS", default_value_t = DEFAULT_IDLE_TTL.as_secs())]
    pub session_ttl_secs: u64,

    /// Log filter (e.g. `info`, `singalong_core=debug`).
    #[arg(long, env = "SINGALONG_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Link shown to users whose token was rejected.
    #[arg(long, env = "SINGALONG_TOKEN_HELP_URL", default_value = DEFAULT_TOKEN_HELP_URL)]
    pub token_help_url: String,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Upstream group name.
    pub group: String,
    /// Development mode.
    pub development: bool,
    /// Upstream API base URL.
    pub api_url: String,
    /// Per-call upstream deadline.
    pub timeout: Duration,
    /// Idle lifetime of a browser session.
    pub session_ttl: Duration,
    /// Log level filter.
    pub log_level: String,
    /// Token creation page linked from the invalid-credential message.
    pub token_help_url: String,
}

impl ServerConfig {
    /// Build the configuration from parsed arguments.
    ///
    /// Bind address priority: `--bind-addr` / `SINGALONG_BIND_ADDR`, then
    /// `PORT` (all interfaces, or loopback in development), then port 8080.
    #[must_use]
    pub fn from_cli(cli: Cli) -> Self {
        let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok());
        Self::resolve(cli, port)
    }

    fn resolve(cli: Cli, port: Option<u16>) -> Self {
        let bind_addr = cli.bind_addr.unwrap_or_else(|| {
            let port = port.unwrap_or(DEFAULT_PORT);
            if cli.development {
                SocketAddr::from(([127, 0, 0, 1], port))
            } else {
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        });

        let timeout = if cli.timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(cli.timeout_secs)
        };

        let session_ttl = if cli.session_ttl_secs == 0 {
            DEFAULT_IDLE_TTL
        } else {
            Duration::from_secs(cli.session_ttl_secs)
        };

        Self {
            bind_addr,
            group: cli.group,
            development: cli.development,
            api_url: cli.api_url,
            timeout,
            session_ttl,
            log_level: cli.log_level,
            token_help_url: cli.token_help_url,
        }
    }
}
