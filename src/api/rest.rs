// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The dashboard reads the last finished
// scan, drills into a cached series, and triggers scans on demand. Scans are
// never started implicitly by a read.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::{AppState, StatusSnapshot};
use crate::error::ScanError;
use crate::indicators::IndicatorSet;
use crate::market_data::SeriesKey;
use crate::scoring::momentum::momentum_series;
use crate::types::{PricePoint, ScoringStrategy, VolatilityMode};
use crate::watchlist::{spawn_scan, ScanRequest};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/config", get(config))
        .route("/api/v1/scan", post(trigger_scan))
        .route("/api/v1/watchlist", get(watchlist))
        .route("/api/v1/watchlist/top", get(top_opportunities))
        .route("/api/v1/series/:ticker", get(series))
        .route("/api/v1/cache/invalidate", post(invalidate_cache))
        .route("/api/v1/errors", get(recent_errors))
        // ── WebSocket (handled separately in ws module but mounted here) ─
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    #[serde(flatten)]
    snapshot: StatusSnapshot,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        snapshot: state.status(),
    })
}

// =============================================================================
// Config
// =============================================================================

#[derive(Serialize)]
struct ConfigResponse {
    tickers: Vec<String>,
    index_symbol: String,
    period: String,
    interval: String,
    volatility_mode: VolatilityMode,
    scoring_strategy: ScoringStrategy,
    strategies: [ScoringStrategy; 2],
    top_n: usize,
    throttle_ms: u64,
    export_dir: String,
}

async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let c = state.runtime_config.read();
    Json(ConfigResponse {
        tickers: c.tickers.clone(),
        index_symbol: c.index_symbol.clone(),
        period: c.period.clone(),
        interval: c.interval.clone(),
        volatility_mode: c.volatility_mode,
        scoring_strategy: c.scoring_strategy,
        strategies: [ScoringStrategy::RuleTable, ScoringStrategy::Momentum],
        top_n: c.top_n,
        throttle_ms: c.throttle_ms,
        export_dir: c.export_dir.clone(),
    })
}

// =============================================================================
// Scan trigger
// =============================================================================

async fn trigger_scan(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ScanRequest>>,
) -> Response {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    info!(refresh = request.refresh, index = ?request.index_symbol, "scan requested via API");

    // The job runs on its own task: a client that disconnects mid-scan only
    // drops the handle, the scan still finishes and publishes its event.
    let outcome = match spawn_scan(state.clone(), request).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("scan task failed: {e}")),
    };

    match outcome {
        Ok(report) => Json(report).into_response(),
        Err(ScanError::TotalDataUnavailable { attempted, diagnostics }) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": format!("no data available: all {attempted} tickers failed"),
                "diagnostics": diagnostics,
            })),
        )
            .into_response(),
        Err(e @ ScanError::ScanInProgress) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// =============================================================================
// Watchlist
// =============================================================================

async fn watchlist(State(state): State<Arc<AppState>>) -> Response {
    match state.latest_report() {
        Some(report) => Json(report.watchlist.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "no scan has finished yet"),
    }
}

async fn top_opportunities(State(state): State<Arc<AppState>>) -> Response {
    match state.latest_report() {
        Some(report) => Json(report.top_opportunities.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "no scan has finished yet"),
    }
}

// =============================================================================
// Series drill-down
// =============================================================================

#[derive(Serialize)]
struct SeriesResponse {
    ticker: String,
    period: String,
    interval: String,
    fetched_at: Option<chrono::DateTime<chrono::Utc>>,
    prices: Arc<Vec<PricePoint>>,
    indicators: IndicatorSet,
    momentum: Vec<Option<f64>>,
}

async fn series(State(state): State<Arc<AppState>>, Path(ticker): Path<String>) -> Response {
    let ticker = ticker.trim().to_uppercase();
    let Some((key, prices)) = state.series_cache.latest_for_ticker(&ticker) else {
        return error_response(StatusCode::NOT_FOUND, format!("no cached series for {ticker}"));
    };

    let mode = state.runtime_config.read().volatility_mode;
    let indicators = IndicatorSet::compute(&prices, mode);
    let momentum = momentum_series(&indicators.daily_return, &indicators.volatility);

    Json(SeriesResponse {
        fetched_at: state.series_cache.fetched_at(&key),
        ticker: key.ticker,
        period: key.period,
        interval: key.interval,
        prices,
        indicators,
        momentum,
    })
    .into_response()
}

// =============================================================================
// Cache invalidation
// =============================================================================

/// `{}` clears everything, `{ticker}` drops every series of that ticker, and
/// `{ticker, period, interval}` drops exactly one series.
#[derive(Deserialize, Default)]
struct InvalidateRequest {
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    interval: Option<String>,
}

async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    body: Option<Json<InvalidateRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let ticker = request
        .ticker
        .as_deref()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty());

    let removed = match (ticker.as_deref(), request.period.as_deref(), request.interval.as_deref()) {
        (Some(ticker), Some(period), Some(interval)) => {
            usize::from(state.series_cache.invalidate(&SeriesKey::new(ticker, period, interval)))
        }
        (Some(ticker), _, _) => state.series_cache.invalidate_ticker(ticker),
        (None, _, _) => state.series_cache.clear(),
    };
    state.increment_version();
    info!(ticker = ?ticker, removed, "series cache invalidated via API");

    Json(serde_json::json!({ "removed": removed }))
}

// =============================================================================
// Diagnostics
// =============================================================================

async fn recent_errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent_errors.read().clone())
}
