use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaserve_scanner::RescanScheduler;
use mediaserve_server::{create_router, AppState, ServerConfig};

/// Content-addressed media catalogue server
#[derive(Debug, Parser)]
#[command(name = "mediaserve-server", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the media storage tree
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Background rescan interval in seconds (0 disables)
    #[arg(long)]
    rescan_interval: Option<u64>,

    /// Cities CSV enabling reverse geocoding
    #[arg(long)]
    cities_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediaserve=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration; command-line flags override file values
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };
    if let Some(storage_dir) = cli.storage_dir {
        config.storage_dir = storage_dir;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(interval) = cli.rescan_interval {
        config.rescan_interval_secs = interval;
    }
    if let Some(cities_file) = cli.cities_file {
        config.cities_file = Some(cities_file);
    }
    tracing::info!("server configuration: {:?}", config);

    // Ensure the storage tree and thumbnail store exist
    std::fs::create_dir_all(&config.storage_dir)?;
    std::fs::create_dir_all(config.thumbnail_dir())?;

    // Setup shared state
    let state = Arc::new(AppState::new(config));

    // Initial scan: a failure is logged and the server starts with an
    // empty catalogue rather than refusing to come up
    tracing::info!(
        "performing initial scan of {}",
        state.config.storage_dir.display()
    );
    match Arc::clone(&state.scanner).scan_off_thread().await {
        Ok(snapshot) => {
            state.index.publish(snapshot).await;
            tracing::info!(
                "initial scan complete, catalogue holds {} items",
                state.index.len().await
            );
        }
        Err(e) => {
            tracing::error!("initial scan failed: {e}; starting with an empty catalogue");
        }
    }

    // Background rescanning, tied to process lifetime via the token
    let cancel = CancellationToken::new();
    let scheduler = RescanScheduler::spawn(
        Arc::clone(&state.scanner),
        Arc::clone(&state.index),
        Duration::from_secs(state.config.rescan_interval_secs),
        cancel.clone(),
    );

    // Build router and serve
    let app = create_router(Arc::clone(&state));
    let bind_addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("MediaServe listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    // An in-flight scan is abandoned without publishing
    cancel.cancel();
    if let Some(handle) = scheduler {
        let _ = handle.await;
    }

    Ok(())
}

/// Resolve on Ctrl+C and stop the background scheduler with the server
async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("shutdown requested");
    cancel.cancel();
}
