//! Serve command

use crate::cli::ServeArgs;
use crate::commands::load_config;
use crate::output;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use updraft_server::{serve, DistributionService, UpdateStats, API_PREFIX};
use updraft_store::{open_object_store, ManifestStore};

pub async fn run(args: ServeArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let manifests = ManifestStore::new(config.manifests.dir.as_std_path());
    let objects = open_object_store(&config.store, Some(config.server.download_target.as_str()))
        .await
        .context("Failed to open download object store")?;

    output::header("Distribution API");
    output::kv("Manifests", manifests.dir().display().to_string().as_str());
    output::kv("Downloads", objects.name());
    for channel in manifests.published_channels() {
        output::kv("Channel", channel.as_str());
    }

    let service = Arc::new(DistributionService::new(
        manifests,
        objects,
        Arc::new(UpdateStats::new()),
    ));

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    output::success(&format!(
        "Serving on http://{}:{}{} (Ctrl-C to stop)",
        host, port, API_PREFIX
    ));

    serve(listener, service, shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
