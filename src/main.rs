// =============================================================================
// Options Watchlist — Main Entry Point
// =============================================================================
//
// Loads the config, wires the Yahoo price client and the NSE option-chain
// client into the shared state, optionally runs one scan at startup, then
// serves the dashboard API until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod error;
mod export;
mod indicators;
mod market_data;
mod option_chain;
mod runtime_config;
mod scoring;
mod types;
mod watchlist;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::YahooChartClient;
use crate::option_chain::NseOptionChainClient;
use crate::runtime_config::RuntimeConfig;
use crate::watchlist::{spawn_scan, ScanRequest};

const CONFIG_PATH: &str = "watchlist_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Options Watchlist — Starting Up                   ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    // `file_config` is what gets saved back; env overrides only live in the
    // runtime copy.
    let file_config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    let config = file_config.with_overrides(|key| std::env::var(key).ok());

    info!(
        tickers = ?config.tickers,
        index = %config.index_symbol,
        strategy = %config.scoring_strategy,
        volatility = %config.volatility_mode,
        "Configured watchlist universe"
    );

    // ── 2. Upstream clients ──────────────────────────────────────────────
    let prices = Arc::new(YahooChartClient::new(config.price_base_url.clone())?);
    let chains = Arc::new(NseOptionChainClient::new(config.option_chain_base_url.clone())?);

    let bind_addr = config.bind_addr.clone();
    let scan_on_startup = config.scan_on_startup;

    // ── 3. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config, prices, chains));

    // ── 4. Optional startup scan ─────────────────────────────────────────
    if scan_on_startup {
        let startup_scan = spawn_scan(state.clone(), ScanRequest::default());
        tokio::spawn(async move {
            match startup_scan.await {
                Ok(Ok(report)) => info!(
                    scan_id = %report.watchlist.scan_id,
                    rows = report.watchlist.entries.len(),
                    "Startup scan complete"
                ),
                Ok(Err(e)) => error!(error = %e, "Startup scan failed"),
                Err(e) => error!(error = %e, "Startup scan task panicked"),
            }
        });
    }

    // ── 5. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    if let Err(e) = file_config.save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Options Watchlist shut down complete.");
    Ok(())
}
