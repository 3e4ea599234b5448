// =============================================================================
// Momentum Opportunity Score
// =============================================================================
//
//   score = (daily_return * 100) / (volatility + 1e-6)
//
// A continuous, per-row figure used to rank rows by risk-adjusted move. It is
// a separate strategy from the rule table and never feeds into it.

/// Keeps the denominator away from zero on flat series.
pub const EPSILON: f64 = 1e-6;

/// Momentum score for one row.
pub fn momentum_score(daily_return: Option<f64>, volatility: Option<f64>) -> Option<f64> {
    let score = daily_return? * 100.0 / (volatility? + EPSILON);
    score.is_finite().then_some(score)
}

/// Momentum score for every row of aligned return / volatility series.
pub fn momentum_series(daily_return: &[Option<f64>], volatility: &[Option<f64>]) -> Vec<Option<f64>> {
    daily_return
        .iter()
        .zip(volatility.iter())
        .map(|(&r, &v)| momentum_score(r, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_value() {
        let s = momentum_score(Some(0.01), Some(0.02)).unwrap();
        assert!((s - 1.0 / (0.02 + EPSILON)).abs() < 1e-9);
    }

    #[test]
    fn zero_volatility_is_finite() {
        let s = momentum_score(Some(0.001), Some(0.0)).unwrap();
        assert!((s - 0.1 / EPSILON).abs() < 1e-3);
    }

    #[test]
    fn missing_input_is_none() {
        assert!(momentum_score(None, Some(0.01)).is_none());
        assert!(momentum_score(Some(0.01), None).is_none());
    }

    #[test]
    fn series_is_aligned() {
        let s = momentum_series(&[None, Some(0.02)], &[None, Some(0.01)]);
        assert_eq!(s.len(), 2);
        assert!(s[0].is_none());
        assert!(s[1].unwrap() > 0.0);
    }
}
