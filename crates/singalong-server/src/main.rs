//! `Singalong` server entry point.
//!
//! Parses the command line, initialises logging, builds the resolution core
//! and the session store, then starts the Axum HTTP server with graceful
//! shutdown.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use singalong_core::Gateway;
use singalong_server::config::{Cli, ServerConfig};
use singalong_server::routes;
use singalong_server::state::AppState;
use singalong_session::MemorySessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_cli(Cli::parse());

    init_tracing(&config);

    info!(
        group = %config.group,
        api_url = %config.api_url,
        development = config.development,
        "Singalong starting"
    );

    let state = build_app_state(&config)?;
    let app = routes::app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Singalong server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Singalong server stopped");
    Ok(())
}

/// JSON logs in production, human-readable logs in development.
fn init_tracing(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.development {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }
}

fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let gateway = Gateway::http(&config.api_url, config.timeout)
        .context("failed to build upstream API client")?;

    info!(
        timeout_secs = config.timeout.as_secs(),
        session_ttl_secs = config.session_ttl.as_secs(),
        "upstream client ready, resolution cache empty"
    );

    Ok(Arc::new(AppState {
        gateway,
        sessions: Arc::new(MemorySessionStore::with_idle_ttl(config.session_ttl)),
        group: config.group.clone(),
        token_help_url: config.token_help_url.clone(),
        secure_cookies: !config.development,
    }))
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
