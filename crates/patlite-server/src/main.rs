//! Signal tower HTTP server.
//!
//! Connects to the tower at startup (unless `--no-connect`), serves the JSON
//! API until Ctrl+C, then turns the tower off and releases it.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use patlite_hardware::DeviceController;
use patlite_server::{ApiServer, Config, api};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("patlite-worker")
        .build()
        .context("failed to start the async runtime")?;

    let transport = config.transport()?;
    let controller = Arc::new(DeviceController::new(transport));
    info!(
        "Controlling {} (patlite {})",
        controller.connection().description(),
        patlite_core::VERSION
    );

    if config.no_connect {
        info!("Startup connect skipped, use POST /connect");
    } else if let Err(e) = runtime.block_on(controller.connect()) {
        warn!("Startup connect failed: {}; use POST /connect to retry", e);
    }

    let api_server = ApiServer::new(Arc::clone(&controller), runtime.handle().clone());
    let served = api::serve(api_server, config.bind, shutdown_signal());

    runtime.block_on(controller.disconnect());
    served
}
