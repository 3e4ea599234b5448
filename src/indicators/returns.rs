// =============================================================================
// Daily Returns & Volatility
// =============================================================================
//
// daily_return[i] = (close[i] - close[i-1]) / close[i-1]
//
// Volatility is the sample standard deviation (n - 1 denominator) of daily
// returns, either over a trailing window or over the full history scaled by
// sqrt(252) trading days.
// =============================================================================

use crate::types::VolatilityMode;

/// Trading days per year used by the annualised variant.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Simple returns aligned with `closes`.
///
/// Index 0 is always `None`. A zero or non-finite previous close yields `None`
/// at that index instead of an infinity.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(None);

    for w in closes.windows(2) {
        let (prev, cur) = (w[0], w[1]);
        let r = (cur - prev) / prev;
        out.push(if prev != 0.0 && r.is_finite() { Some(r) } else { None });
    }

    out
}

/// Rolling sample standard deviation of `returns` over `window` values.
///
/// An output is `Some` only when every value in the trailing window is
/// present, so the leading `None` return pushes the first value to index
/// `window`.
pub fn rolling_volatility(returns: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; returns.len()];
    }

    (0..returns.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &returns[i + 1 - window..=i];
            let values: Option<Vec<f64>> = slice.iter().copied().collect();
            values.and_then(|v| sample_std(&v))
        })
        .collect()
}

/// Sample standard deviation of all present returns multiplied by sqrt(252).
pub fn annualized_volatility(returns: &[Option<f64>]) -> Option<f64> {
    let values: Vec<f64> = returns.iter().flatten().copied().collect();
    sample_std(&values).map(|s| s * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Volatility series for the selected mode.
///
/// The annualised variant is a single figure over the whole history; it is
/// reported on the last index only so the series stays aligned with the
/// price rows.
pub fn volatility_series(returns: &[Option<f64>], mode: VolatilityMode) -> Vec<Option<f64>> {
    match mode {
        VolatilityMode::Rolling { window } => rolling_volatility(returns, window),
        VolatilityMode::Annualized => {
            let mut out = vec![None; returns.len()];
            if let Some(last) = out.last_mut() {
                *last = annualized_volatility(returns);
            }
            out
        }
    }
}

/// Sample standard deviation; `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    std.is_finite().then_some(std)
}
