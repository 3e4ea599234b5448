// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators used by the
// watchlist scanner.  Every series is aligned one-to-one with the input price
// rows and uses `Option` for rows that do not yet have enough history.

pub mod bands;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;

use serde::Serialize;

use crate::types::{PricePoint, VolatilityMode};

/// Default RSI look-back.
pub const RSI_WINDOW: usize = 14;

/// Per-date indicator series for one ticker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorSet {
    pub daily_return: Vec<Option<f64>>,
    pub volatility: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub support: Vec<Option<f64>>,
    pub resistance: Vec<Option<f64>>,
}

/// Latest value of every indicator series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatestIndicators {
    pub daily_return: Option<f64>,
    pub volatility: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

impl IndicatorSet {
    /// Compute every indicator for `prices` (oldest first).
    pub fn compute(prices: &[PricePoint], volatility_mode: VolatilityMode) -> Self {
        let n = prices.len();
        let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();

        let daily_return = returns::daily_returns(&closes);
        let volatility = returns::volatility_series(&daily_return, volatility_mode);
        let rsi = rsi::calculate_rsi(&closes, RSI_WINDOW);

        let m = macd::calculate_macd(&closes);
        let macd = pad(m.macd, n);
        let signal = pad(m.signal, n);

        let b = bands::calculate_bands(prices, bands::DEFAULT_WINDOW);

        Self {
            daily_return,
            volatility,
            rsi,
            macd,
            signal,
            support: b.support,
            resistance: b.resistance,
        }
    }

    /// Values at the last row.
    pub fn latest(&self) -> LatestIndicators {
        fn last(v: &[Option<f64>]) -> Option<f64> {
            v.last().copied().flatten()
        }

        LatestIndicators {
            daily_return: last(&self.daily_return),
            volatility: last(&self.volatility),
            rsi: last(&self.rsi),
            macd: last(&self.macd),
            signal: last(&self.signal),
            support: last(&self.support),
            resistance: last(&self.resistance),
        }
    }
}

/// Lift a dense series into an aligned optional one, padding a truncated
/// tail with `None`.
fn pad(values: Vec<f64>, len: usize) -> Vec<Option<f64>> {
    let mut out: Vec<Option<f64>> = values.into_iter().map(Some).collect();
    out.resize(len, None);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint {
                date: start + Days::new(i as u64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn all_series_aligned_with_prices() {
        let prices = series(&(1..=40).map(|x| 100.0 + x as f64).collect::<Vec<_>>());
        let set = IndicatorSet::compute(&prices, VolatilityMode::default());
        for s in [
            &set.daily_return,
            &set.volatility,
            &set.rsi,
            &set.macd,
            &set.signal,
            &set.support,
            &set.resistance,
        ] {
            assert_eq!(s.len(), 40);
        }
    }

    #[test]
    fn single_row_has_no_return() {
        let set = IndicatorSet::compute(&series(&[100.0]), VolatilityMode::default());
        assert_eq!(set.daily_return, vec![None]);
        let latest = set.latest();
        assert!(latest.volatility.is_none());
        assert!(latest.rsi.is_none());
        assert_eq!(latest.macd, Some(0.0));
    }

    #[test]
    fn latest_picks_last_row() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64 * 10.0).collect();
        let prices = series(&closes);
        let latest = IndicatorSet::compute(&prices, VolatilityMode::default()).latest();
        assert_eq!(latest.resistance, Some(301.0));
        assert_eq!(latest.support, Some(109.0));
        assert_eq!(latest.rsi, Some(100.0));
        assert!(latest.volatility.is_some());
    }

    #[test]
    fn empty_prices_give_empty_set() {
        let set = IndicatorSet::compute(&[], VolatilityMode::Annualized);
        assert!(set.daily_return.is_empty());
        assert_eq!(set.latest(), LatestIndicators::default());
    }
}
