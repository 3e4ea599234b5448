// =============================================================================
// Support / Resistance Bands
// =============================================================================
//
// Support is the rolling minimum of the daily low and resistance the rolling
// maximum of the daily high over a trailing window (20 sessions by default).
// Callers generally keep only the latest value.

use crate::types::PricePoint;

/// Default look-back for the bands.
pub const DEFAULT_WINDOW: usize = 20;

/// Rolling support and resistance, aligned with the input series.
#[derive(Debug, Clone, Default)]
pub struct BandSeries {
    pub support: Vec<Option<f64>>,
    pub resistance: Vec<Option<f64>>,
}

/// Compute rolling min(low) / max(high) over `window` rows.
///
/// The first `window - 1` values are `None`; `window == 0` yields all `None`.
pub fn calculate_bands(prices: &[PricePoint], window: usize) -> BandSeries {
    let n = prices.len();
    if window == 0 {
        return BandSeries {
            support: vec![None; n],
            resistance: vec![None; n],
        };
    }

    let mut support = Vec::with_capacity(n);
    let mut resistance = Vec::with_capacity(n);

    for i in 0..n {
        if i + 1 < window {
            support.push(None);
            resistance.push(None);
            continue;
        }
        let slice = &prices[i + 1 - window..=i];
        let low = slice.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
        let high = slice.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        support.push(low.is_finite().then_some(low));
        resistance.push(high.is_finite().then_some(high));
    }

    BandSeries { support, resistance }
}
