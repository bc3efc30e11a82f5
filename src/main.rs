//! chatrelayd - line-based chat relay daemon.
//!
//! Clients register a nickname and send direct messages to each other by
//! nickname. The user registered as `admin` can shut the server down.

mod config;
mod error;
mod handlers;
mod network;
mod state;

use crate::config::Config;
use crate::network::{Gateway, Supervisor};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let loaded = Config::load(&config_path);

    // Initialize tracing: RUST_LOG wins, then the configured level
    let fallback = loaded
        .as_ref()
        .ok()
        .and_then(Config::tracing_directive)
        .unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(true)
        .init();

    let config = loaded.map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        host = %config.host,
        port = config.port,
        buffer_size = config.buffer_size,
        "Starting chatrelayd"
    );

    let supervisor = Arc::new(Supervisor::new());
    let gateway = Gateway::bind(
        &config.bind_address(),
        config.buffer_size,
        Arc::clone(&supervisor),
    )
    .await
    .map_err(|e| {
        error!(address = %config.bind_address(), error = %e, "Failed to bind");
        e
    })?;

    {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => {
                    warn!(error = %e, "Cannot listen for shutdown signals");
                    return;
                }
            }
            supervisor.request_shutdown();
        });
    }

    gateway.run().await?;
    info!("Server stopped");
    Ok(())
}

/// Wait for SIGTERM or SIGINT.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
    Ok(())
}

/// Wait for Ctrl-C.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
