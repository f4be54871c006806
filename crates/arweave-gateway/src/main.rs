//! Arweave Gateway - upload images to Arweave and serve cached transaction data
//!
//! Signs uploads with a local keystore, fetches transaction data through a
//! disk cache, and renders a wallet status page.

mod adapter;
mod config;
mod error;
mod render;
mod server;
mod snapshot;
mod types;
mod validation;

use crate::adapter::StorageAdapter;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::render::PageRenderer;
use crate::server::{start_server, ServerState, SharedState};
use crate::snapshot::SnapshotStore;
use arweave_client::{ArweaveClient, Wallet};
use file_blob_cache::BlobCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("arweave_gateway=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Arweave Gateway...");

    let config = GatewayConfig::from_env()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Primary node: {}", config.primary_node);
    info!("Backup node: {}", config.backup_node);
    info!("Max upload size: {} bytes", config.max_upload_size);

    // No key, no gateway: exit before binding the port
    let state = match prepare_state(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!(key_file = ?config.key_file, error = %e, "Gateway startup failed");
            std::process::exit(1);
        }
    };

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| GatewayError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Everything that must succeed before the port is bound: wallet, cache and node clients
async fn prepare_state(config: &GatewayConfig) -> Result<SharedState> {
    let wallet = Wallet::load(&config.key_file)?;
    info!("Wallet address: {}", wallet.address());

    let cache = BlobCache::new(&config.cache_dir);
    cache.init().await?;

    let timeout = Duration::from_secs(config.network_timeout_secs);
    let primary = Arc::new(ArweaveClient::with_timeout(config.primary_node.clone(), timeout)?);
    let backup = Arc::new(ArweaveClient::with_timeout(config.backup_node.clone(), timeout)?);

    let probe = Arc::clone(&primary);
    tokio::spawn(async move {
        match probe.network_info().await {
            Ok(info) => info!(
                network = %info.network,
                height = info.height,
                "Connected to Arweave node"
            ),
            Err(e) => warn!(error = %e, "Arweave node unreachable at startup"),
        }
    });

    let snapshots = SnapshotStore::new(&config.stats_file);
    info!("Wallet snapshot file: {:?}", snapshots.path());

    let adapter = StorageAdapter::new(Arc::new(wallet), primary, backup, Arc::new(cache));
    Ok(Arc::new(ServerState::new(
        adapter,
        snapshots,
        PageRenderer::new(config.explorer_url.clone()),
        config.max_upload_size,
    )))
}
