use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelgate_core::{
    load_config, load_config_from_env, validate_config, Config, ConfigError, RadarrClient,
    ResponseCache, ToolRouter,
};
use reelgate_server::api::create_router;
use reelgate_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (path, explicit) = config_path();
    let config = load(&path, explicit)?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        url = %config.upstream.url,
        timeout_ms = config.upstream.timeout_ms,
        max_retries = config.upstream.max_retries,
        max_connections = config.upstream.max_connections,
        cache_ttl_secs = config.cache.ttl_secs,
        "Upstream settings"
    );

    let client = RadarrClient::new(&config.upstream).context("Failed to create upstream client")?;
    let cache = Arc::new(ResponseCache::new(config.cache.ttl()));
    let tools = ToolRouter::new(Arc::new(client), cache);
    info!("Tool router ready with {} tools", tools.definitions().len());

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, tools));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Config path from `REELGATE_CONFIG`, falling back to `config.toml`.
fn config_path() -> (PathBuf, bool) {
    match std::env::var("REELGATE_CONFIG") {
        Ok(path) => (PathBuf::from(path), true),
        Err(_) => (PathBuf::from("config.toml"), false),
    }
}

/// Load the config file. Without an explicit path a missing default file
/// falls back to environment variables only.
fn load(path: &Path, explicit: bool) -> Result<Config> {
    info!("Loading configuration from {:?}", path);
    match load_config(path) {
        Err(ConfigError::FileNotFound(_)) if !explicit => {
            warn!("No config file at {:?}, using environment only", path);
            load_config_from_env().context("Failed to load config from environment")
        }
        result => result.with_context(|| format!("Failed to load config from {:?}", path)),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
