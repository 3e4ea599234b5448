// =============================================================================
// Watchlist Builder — one entry per ticker, ranked by score
// =============================================================================
//
// Entry assembly and ranking are pure: every entry's score depends only on its
// own indicator readings and the shared option-chain summary. Ranking is a
// stable sort, so ties keep the order in which tickers were scanned.

use crate::error::{ScanError, ScanResult};
use crate::indicators::IndicatorSet;
use crate::option_chain::OptionChainSummary;
use crate::scoring::{self, momentum_score, rule_score, ScoreInputs};
use crate::types::{PricePoint, ScoringStrategy, VolatilityMode, WatchlistEntry};

/// Default number of top opportunities exposed per scan.
pub const DEFAULT_TOP_N: usize = 5;

/// Build the watchlist row for one ticker.
///
/// Fails with `ComputationFailure` when the series is empty or contains
/// non-finite prices.
pub fn build_entry(
    ticker: &str,
    prices: &[PricePoint],
    chain: Option<&OptionChainSummary>,
    volatility_mode: VolatilityMode,
) -> ScanResult<WatchlistEntry> {
    let last = prices
        .last()
        .ok_or_else(|| ScanError::computation(ticker, "price series is empty"))?;

    if let Some(bad) = prices
        .iter()
        .find(|p| !(p.open.is_finite() && p.high.is_finite() && p.low.is_finite() && p.close.is_finite()))
    {
        return Err(ScanError::computation(
            ticker,
            format!("non-finite price on {}", bad.date),
        ));
    }

    let latest = IndicatorSet::compute(prices, volatility_mode).latest();
    let pcr = chain.and_then(|c| c.pcr);

    let score = rule_score(&ScoreInputs {
        volatility: latest.volatility,
        rsi: latest.rsi,
        macd: latest.macd,
        signal: latest.signal,
        pcr,
    });

    Ok(WatchlistEntry {
        ticker: ticker.to_string(),
        last_close: Some(last.close),
        volume: Some(last.volume),
        volatility: latest.volatility,
        rsi: latest.rsi,
        macd: latest.macd,
        signal: latest.signal,
        support: latest.support,
        resistance: latest.resistance,
        call_oi: chain.map(|c| c.total_call_oi),
        put_oi: chain.map(|c| c.total_put_oi),
        pcr,
        score,
        opportunity_score: momentum_score(latest.daily_return, latest.volatility),
    })
}

/// Stable sort of `entries` by the strategy's score, descending.
pub fn rank_entries(entries: &mut [WatchlistEntry], strategy: ScoringStrategy) {
    entries.sort_by(|a, b| scoring::compare_desc(a, b, strategy));
}

/// First `n` entries of an already ranked table.
pub fn select_top(entries: &[WatchlistEntry], n: usize) -> &[WatchlistEntry] {
    &entries[..n.min(entries.len())]
}
