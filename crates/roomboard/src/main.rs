use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogClient;
use crate::config::AppConfig;
use crate::db::DraftStore;
use crate::types::AppState;

mod catalog;
mod config;
mod db;
mod schedule;
mod server;
mod types;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;

    let catalog = CatalogClient::new(&config.catalog).context("building catalog client")?;
    let drafts = DraftStore::new(&config.database_path)
        .with_context(|| format!("opening draft database {}", config.database_path))?;
    let state = Arc::new(AppState::new(catalog, drafts));

    // Warm the cache; the service still starts if the catalog is down
    match state.catalog.load_board(false).await {
        Ok(board) => info!(
            "Initial snapshot: {} rooms, {} subjects",
            board.snapshot.rooms.len(),
            board.snapshot.subjects.len()
        ),
        Err(e) => warn!("Initial snapshot failed, will retry on demand: {}", e),
    }

    let app = server::create_router(state);
    let listener = TcpListener::bind((config.address.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.address, config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
