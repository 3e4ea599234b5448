// =============================================================================
// Scanner — sequential fetch → indicators → score loop over the ticker list
// =============================================================================
//
// 1. Fetch the option chain once for the index symbol (shared by all tickers).
// 2. For each ticker, in order: load the price series (cache first), build the
//    entry, append it to the table.  A failing ticker is skipped and recorded
//    as a diagnostic.
// 3. Rank the table and hand back a `Watchlist`.
//
// Every upstream request after the first is preceded by the fixed throttle
// delay. If every ticker fails the scan fails with `TotalDataUnavailable`.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::builder::{build_entry, rank_entries, select_top};
use crate::error::{DiagnosticKind, ScanDiagnostic, ScanError, ScanResult};
use crate::market_data::{FixedDelayThrottle, PriceHistoryProvider, SeriesCache, SeriesKey};
use crate::option_chain::{analyze_chain, OptionChainProvider, OptionChainSummary};
use crate::types::{PricePoint, ScoringStrategy, VolatilityMode, WatchlistEntry};

/// Everything a scan needs to know, resolved from config + request.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSettings {
    pub tickers: Vec<String>,
    pub period: String,
    pub interval: String,
    /// Index whose option chain feeds OI/PCR; `None` skips the option chain.
    pub index_symbol: Option<String>,
    pub volatility_mode: VolatilityMode,
    pub strategy: ScoringStrategy,
    pub top_n: usize,
    /// Bypass (and refresh) cached series.
    pub refresh: bool,
}

/// Result table of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct Watchlist {
    pub scan_id: String,
    pub scan_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub index_symbol: Option<String>,
    pub strategy: ScoringStrategy,
    pub top_n: usize,
    pub option_chain: Option<OptionChainSummary>,
    /// Ranked, best first.
    pub entries: Vec<WatchlistEntry>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl Watchlist {
    /// The first `top_n` ranked entries.
    pub fn top_opportunities(&self) -> &[WatchlistEntry] {
        select_top(&self.entries, self.top_n)
    }
}

/// Borrowed collaborators for a single scan.
pub struct Scanner<'a> {
    prices: &'a dyn PriceHistoryProvider,
    chains: &'a dyn OptionChainProvider,
    cache: &'a SeriesCache,
    throttle: &'a FixedDelayThrottle,
}

impl<'a> Scanner<'a> {
    pub fn new(
        prices: &'a dyn PriceHistoryProvider,
        chains: &'a dyn OptionChainProvider,
        cache: &'a SeriesCache,
        throttle: &'a FixedDelayThrottle,
    ) -> Self {
        Self {
            prices,
            chains,
            cache,
            throttle,
        }
    }

    pub async fn run(&self, settings: &ScanSettings) -> ScanResult<Watchlist> {
        let started_at = Utc::now();
        let scan_id = Uuid::new_v4().to_string();
        let mut diagnostics = Vec::new();
        let mut requests_sent = 0usize;

        info!(
            scan_id = %scan_id,
            tickers = settings.tickers.len(),
            index = ?settings.index_symbol,
            strategy = %settings.strategy,
            "scan started"
        );

        // ── Option chain (once per scan) ────────────────────────────────
        let option_chain = match &settings.index_symbol {
            Some(index) => {
                requests_sent += 1;
                match self.chains.fetch_chain(index).await {
                    Ok(snapshot) => Some(analyze_chain(&snapshot)),
                    Err(e) => {
                        warn!(index = %index, error = %e, "option chain unavailable — OI/PCR left empty");
                        diagnostics.push(ScanDiagnostic::new(
                            DiagnosticKind::OptionChainUnavailable,
                            None,
                            format!("option chain for {index} unavailable: {e:#}"),
                        ));
                        None
                    }
                }
            }
            None => None,
        };

        // ── Per-ticker loop ─────────────────────────────────────────────
        let mut entries = Vec::with_capacity(settings.tickers.len());

        for ticker in &settings.tickers {
            let result = match self.load_series(ticker, settings, &mut requests_sent).await {
                Ok(series) => build_entry(ticker, &series, option_chain.as_ref(), settings.volatility_mode),
                Err(e) => Err(e),
            };

            match result {
                Ok(entry) => {
                    info!(ticker = %ticker, score = entry.score, rsi = ?entry.rsi, "ticker scored");
                    entries.push(entry);
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "ticker skipped");
                    diagnostics.push(e.to_diagnostic());
                }
            }
        }

        if entries.is_empty() && !settings.tickers.is_empty() {
            return Err(ScanError::TotalDataUnavailable {
                attempted: settings.tickers.len(),
                diagnostics,
            });
        }

        rank_entries(&mut entries, settings.strategy);

        let finished_at = Utc::now();
        info!(
            scan_id = %scan_id,
            rows = entries.len(),
            skipped = diagnostics.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "scan finished"
        );

        Ok(Watchlist {
            scan_id,
            scan_date: started_at.date_naive(),
            started_at,
            finished_at,
            index_symbol: settings.index_symbol.clone(),
            strategy: settings.strategy,
            top_n: settings.top_n,
            option_chain,
            entries,
            diagnostics,
        })
    }

    /// Cached series for `ticker`, fetching (after the throttle delay) on a
    /// miss or when a refresh was requested.
    async fn load_series(
        &self,
        ticker: &str,
        settings: &ScanSettings,
        requests_sent: &mut usize,
    ) -> ScanResult<Arc<Vec<PricePoint>>> {
        let key = SeriesKey::new(ticker, settings.period.as_str(), settings.interval.as_str());

        if !settings.refresh {
            if let Some(series) = self.cache.get(&key) {
                return Ok(series);
            }
        }

        if *requests_sent > 0 {
            self.throttle.pause().await;
        }
        *requests_sent += 1;

        let series = self
            .prices
            .fetch_history(ticker, &settings.period, &settings.interval)
            .await
            .map_err(|e| ScanError::fetch(ticker, format!("{e:#}")))?;

        if series.is_empty() {
            return Err(ScanError::fetch(ticker, "provider returned no rows"));
        }

        Ok(self.cache.insert(key, series))
    }
}
