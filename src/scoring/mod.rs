// =============================================================================
// Scoring Module
// =============================================================================
//
// Two independent scoring strategies:
//
//   1. Rule table — discrete thresholds over volatility, RSI, MACD and PCR.
//   2. Momentum   — continuous return-over-volatility figure.
//
// Both are computed for every watchlist entry; `ScoringStrategy` decides which
// one ranks the table.

pub mod momentum;
pub mod rule_table;

pub use momentum::momentum_score;
pub use rule_table::{rule_score, ScoreInputs};

use std::cmp::Ordering;

use crate::types::{ScoringStrategy, WatchlistEntry};

/// Descending comparison of two entries under `strategy`.
///
/// Momentum scores that are missing rank after every present score.
pub fn compare_desc(a: &WatchlistEntry, b: &WatchlistEntry, strategy: ScoringStrategy) -> Ordering {
    match strategy {
        ScoringStrategy::RuleTable => b.score.cmp(&a.score),
        ScoringStrategy::Momentum => match (a.opportunity_score, b.opportunity_score) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
