// =============================================================================
// Shared types used across the watchlist scanner
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Open interest recorded at a single strike of an option chain.
///
/// Either side may be absent in the upstream document; a missing side counts
/// as zero when aggregating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionStrike {
    pub strike_price: f64,
    #[serde(default)]
    pub call_open_interest: Option<u64>,
    #[serde(default)]
    pub put_open_interest: Option<u64>,
}

/// One row of the watchlist: the latest indicator readings for a ticker plus
/// its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub last_close: Option<f64>,
    pub volume: Option<u64>,
    pub volatility: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub call_oi: Option<u64>,
    pub put_oi: Option<u64>,
    pub pcr: Option<f64>,
    /// Rule-table score in [-3, 5].
    pub score: i32,
    /// Latest continuous momentum score (`return * 100 / volatility`).
    pub opportunity_score: Option<f64>,
}

/// How volatility is derived from the daily-return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VolatilityMode {
    /// Sample standard deviation over a trailing window of returns.
    Rolling { window: usize },
    /// Sample standard deviation over the whole history, scaled by sqrt(252).
    Annualized,
}

impl Default for VolatilityMode {
    fn default() -> Self {
        Self::Rolling { window: 20 }
    }
}

impl std::fmt::Display for VolatilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rolling { window } => write!(f, "rolling({window})"),
            Self::Annualized => write!(f, "annualized"),
        }
    }
}

/// Which score ranks the watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Discrete threshold rules over volatility, RSI, MACD and PCR.
    RuleTable,
    /// Continuous `daily_return * 100 / (volatility + eps)`.
    Momentum,
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        Self::RuleTable
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleTable => write!(f, "rule_table"),
            Self::Momentum => write!(f, "momentum"),
        }
    }
}
