// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD   = EMA(close, 12) - EMA(close, 26)
//   Signal = EMA(MACD, 9)
//
// Both EMAs are seeded by the first observation, so the MACD and signal
// series are defined from the very first close.
// =============================================================================

use super::ema::calculate_ema;

pub const FAST_SPAN: usize = 12;
pub const SLOW_SPAN: usize = 26;
pub const SIGNAL_SPAN: usize = 9;

/// MACD line and signal line, aligned with the input closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Compute MACD with explicit spans.
///
/// The lines are truncated to the shortest EMA if a non-finite close breaks
/// one of the recurrences.
pub fn calculate_macd_with(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal = calculate_ema(&macd, signal);

    let len = signal.len();
    MacdSeries {
        macd: macd[..len].to_vec(),
        signal,
    }
}

/// Compute MACD(12, 26, 9).
pub fn calculate_macd(closes: &[f64]) -> MacdSeries {
    calculate_macd_with(closes, FAST_SPAN, SLOW_SPAN, SIGNAL_SPAN)
}
