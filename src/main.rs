// =============================================================================
// Chartwell — Main Entry Point
// =============================================================================
//
// Stock chart server: loads daily OHLCV histories from CSV at startup, then
// serves technical-analysis charts as PNG over HTTP.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod chart;
mod indicators;
mod market_data;
mod server_config;
mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::TimeSeriesStore;
use crate::server_config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Logging & config ──────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║              Chartwell — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = ServerConfig::load("chartwell.json")?;
    config.apply_env();

    info!(
        data_dir = %config.data_dir,
        symbols = ?config.symbols,
        chart = format!("{}x{}", config.chart_width, config.chart_height),
        "Configuration loaded"
    );

    // ── 2. Load market data ──────────────────────────────────────────────
    let store = TimeSeriesStore::load(Path::new(&config.data_dir), &config.symbols);
    if store.is_empty() {
        warn!(
            data_dir = %config.data_dir,
            "no symbol histories loaded — every chart request will 404"
        );
    } else {
        info!(count = store.len(), "Symbol histories loaded");
    }

    // ── 3. Serve ─────────────────────────────────────────────────────────
    let state = Arc::new(AppState::new(config, store));
    let app = api::rest::router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    info!(addr = %state.config.bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chartwell shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
