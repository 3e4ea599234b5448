// =============================================================================
// Rule-Table Scorer — fixed thresholds summed into an integer score
// =============================================================================
//
// | Condition                 | Delta |
// |---------------------------|-------|
// | volatility > 0.02         |  +2   |
// | else volatility > 0.015   |  +1   |
// | rsi < 30                  |  +1   |
// | rsi > 70                  |  -1   |
// | macd > signal             |  +1   |
// | macd <= signal            |  -1   |
// | pcr > 1.2                 |  +1   |
// | pcr < 0.8                 |  +1   |
//
// Every group is evaluated; a missing input makes its group contribute 0.

use serde::{Deserialize, Serialize};

pub const HIGH_VOLATILITY: f64 = 0.02;
pub const ELEVATED_VOLATILITY: f64 = 0.015;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const PCR_HIGH: f64 = 1.2;
pub const PCR_LOW: f64 = 0.8;

/// Lowest score the table can produce.
pub const MIN_SCORE: i32 = -3;
/// Highest score the table can produce.
pub const MAX_SCORE: i32 = 5;

/// Inputs to the rule table. Each is optional because history or option data
/// may be missing for a ticker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub volatility: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub pcr: Option<f64>,
}

/// Per-group breakdown of a rule-table score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub volatility: i32,
    pub rsi: i32,
    pub macd: i32,
    pub pcr: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.volatility + self.rsi + self.macd + self.pcr
    }
}

/// Evaluate each rule group independently.
pub fn score_breakdown(inputs: &ScoreInputs) -> ScoreBreakdown {
    let volatility = match inputs.volatility {
        Some(v) if v > HIGH_VOLATILITY => 2,
        Some(v) if v > ELEVATED_VOLATILITY => 1,
        _ => 0,
    };

    let rsi = match inputs.rsi {
        Some(r) if r < RSI_OVERSOLD => 1,
        Some(r) if r > RSI_OVERBOUGHT => -1,
        _ => 0,
    };

    let macd = match (inputs.macd, inputs.signal) {
        (Some(m), Some(s)) if m > s => 1,
        (Some(_), Some(_)) => -1,
        _ => 0,
    };

    let pcr = match inputs.pcr {
        Some(p) if p > PCR_HIGH || p < PCR_LOW => 1,
        _ => 0,
    };

    ScoreBreakdown {
        volatility,
        rsi,
        macd,
        pcr,
    }
}

/// Integer opportunity score for one ticker.
pub fn rule_score(inputs: &ScoreInputs) -> i32 {
    let total = score_breakdown(inputs).total();
    debug_assert!((MIN_SCORE..=MAX_SCORE).contains(&total), "rule score {total} out of range");
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        volatility: Option<f64>,
        rsi: Option<f64>,
        macd: Option<f64>,
        signal: Option<f64>,
        pcr: Option<f64>,
    ) -> ScoreInputs {
        ScoreInputs {
            volatility,
            rsi,
            macd,
            signal,
            pcr,
        }
    }

    #[test]
    fn maximum_score() {
        let i = inputs(Some(0.03), Some(25.0), Some(1.0), Some(0.5), Some(1.5));
        assert_eq!(rule_score(&i), 5);
    }

    #[test]
    fn low_pcr_also_scores() {
        let i = inputs(Some(0.016), Some(50.0), Some(0.0), Some(0.0), Some(0.5));
        let b = score_breakdown(&i);
        assert_eq!(b.volatility, 1);
        assert_eq!(b.rsi, 0);
        assert_eq!(b.macd, -1); // equal counts as "<="
        assert_eq!(b.pcr, 1);
        assert_eq!(b.total(), 1);
    }

    #[test]
    fn overbought_and_bearish_crossover() {
        let i = inputs(Some(0.01), Some(80.0), Some(-1.0), Some(0.0), Some(1.0));
        assert_eq!(rule_score(&i), -2);
    }

    #[test]
    fn thresholds_are_strict() {
        let i = inputs(Some(0.02), Some(30.0), None, None, Some(1.2));
        let b = score_breakdown(&i);
        assert_eq!(b.volatility, 1);
        assert_eq!(b.rsi, 0);
        assert_eq!(b.pcr, 0);

        let i = inputs(Some(0.015), Some(70.0), None, None, Some(0.8));
        assert_eq!(rule_score(&i), 0);
    }

    #[test]
    fn missing_inputs_contribute_nothing() {
        assert_eq!(rule_score(&ScoreInputs::default()), 0);
        let only_macd = inputs(None, None, Some(1.0), None, None);
        assert_eq!(rule_score(&only_macd), 0);
    }

    #[test]
    fn scorer_is_pure_and_bounded() {
        let vols = [None, Some(0.0), Some(0.016), Some(0.05)];
        let rsis = [None, Some(10.0), Some(50.0), Some(90.0)];
        let macds = [None, Some((1.0, 0.0)), Some((0.0, 1.0))];
        let pcrs = [None, Some(0.5), Some(1.0), Some(2.0)];

        for v in vols {
            for r in rsis {
                for m in macds {
                    for p in pcrs {
                        let i = inputs(v, r, m.map(|x| x.0), m.map(|x| x.1), p);
                        let a = rule_score(&i);
                        assert_eq!(a, rule_score(&i));
                        assert!((MIN_SCORE..=MAX_SCORE).contains(&a), "score {a} out of range");
                    }
                }
            }
        }
    }
}
