//! rugdesk-photos - Photo upload and dimension service
//!
//! Serves the dimension engine over HTTP, runs the batched photo upload
//! pipeline against a local object store and hands out signed download
//! links.

use anyhow::{Context, Result};
use clap::Parser;
use rugdesk_common::config::load_config;
use rugdesk_photos::api::health::BuildInfo;
use rugdesk_photos::config::ServiceConfig;
use rugdesk_photos::logging::init_tracing;
use rugdesk_photos::{build_router, AppState};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "rugdesk-photos")]
#[command(about = "RugDesk photo upload and dimension service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder for stored objects (overrides config and RUGDESK_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// HTTP listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging settings come from the config file, so load it first and
    // report the outcome once the subscriber is installed
    let loaded = load_config(args.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|(c, _)| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging).context("Failed to open log file")?;

    let build = BuildInfo::current();
    info!(
        "Starting RugDesk Photos (rugdesk-photos) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        build.git_hash,
        build.timestamp,
        build.profile
    );

    let (toml_config, source) = loaded.context("Failed to load configuration")?;
    source.log();
    if let Some(path) = &logging.file {
        info!("Logging to {}", path.display());
    }

    let config = ServiceConfig::resolve(toml_config, args.root_folder.as_deref(), args.port)
        .context("Invalid configuration")?;

    let objects_dir = config.objects_dir();
    std::fs::create_dir_all(&objects_dir)
        .with_context(|| format!("Failed to create {}", objects_dir.display()))?;
    info!("Object store: {}", objects_dir.display());

    let state = AppState::from_config(&config);
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("rugdesk-photos listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("rugdesk-photos stopped");
    Ok(())
}

/// Wait for Ctrl+C, then cancel in-flight uploads between batches
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    shutdown.cancel();
}
