// =============================================================================
// Option-Chain Analyzer — open interest totals and put/call ratio
// =============================================================================
//
//   total_call_oi = sum(CE open interest)
//   total_put_oi  = sum(PE open interest)
//   PCR           = total_put_oi / total_call_oi   (None when call OI is 0)
//
// A strike missing one side contributes zero to that side.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::types::OptionStrike;

/// Aggregated view of one option-chain snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionChainSummary {
    pub total_call_oi: u64,
    pub total_put_oi: u64,
    pub pcr: Option<f64>,
    /// Strike prices in snapshot order.
    pub strikes: Vec<f64>,
}

/// Aggregate a snapshot into totals and PCR.
pub fn analyze_chain(snapshot: &[OptionStrike]) -> OptionChainSummary {
    let mut total_call_oi: u64 = 0;
    let mut total_put_oi: u64 = 0;
    let mut strikes = Vec::with_capacity(snapshot.len());

    for strike in snapshot {
        total_call_oi = total_call_oi.saturating_add(strike.call_open_interest.unwrap_or(0));
        total_put_oi = total_put_oi.saturating_add(strike.put_open_interest.unwrap_or(0));
        strikes.push(strike.strike_price);
    }

    OptionChainSummary {
        total_call_oi,
        total_put_oi,
        pcr: put_call_ratio(total_put_oi, total_call_oi),
        strikes,
    }
}

/// `put / call`, or `None` when there is no call open interest.
pub fn put_call_ratio(total_put_oi: u64, total_call_oi: u64) -> Option<f64> {
    if total_call_oi == 0 {
        return None;
    }
    Some(total_put_oi as f64 / total_call_oi as f64)
}

/// Parse the upstream option-chain document.
///
/// Expected shape:
/// ```text
/// { "records": { "data": [
///     { "strikePrice": 22000, "CE": { "openInterest": 100 }, "PE": { ... } },
///     ...
/// ] } }
/// ```
/// Records without a numeric `strikePrice` are skipped; a missing `CE` / `PE`
/// object (or a missing `openInterest` inside it) leaves that side `None`.
pub fn parse_chain_document(body: &serde_json::Value) -> Result<Vec<OptionStrike>> {
    let data = body["records"]["data"]
        .as_array()
        .context("option-chain response missing 'records.data' array")?;

    let mut strikes = Vec::with_capacity(data.len());
    let mut skipped = 0usize;

    for record in data {
        let Some(strike_price) = record["strikePrice"].as_f64() else {
            skipped += 1;
            continue;
        };

        strikes.push(OptionStrike {
            strike_price,
            call_open_interest: open_interest(&record["CE"]),
            put_open_interest: open_interest(&record["PE"]),
        });
    }

    debug!(strikes = strikes.len(), skipped, "option-chain document parsed");
    Ok(strikes)
}

/// Open interest may arrive as an integer or a float (e.g. `1250.0`).
fn open_interest(side: &serde_json::Value) -> Option<u64> {
    let oi = &side["openInterest"];
    oi.as_u64()
        .or_else(|| oi.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strike(price: f64, ce: Option<u64>, pe: Option<u64>) -> OptionStrike {
        OptionStrike {
            strike_price: price,
            call_open_interest: ce,
            put_open_interest: pe,
        }
    }

    #[test]
    fn two_strikes_one_side_each() {
        let snap = vec![strike(100.0, Some(100), None), strike(110.0, None, Some(50))];
        let s = analyze_chain(&snap);
        assert_eq!(s.total_call_oi, 100);
        assert_eq!(s.total_put_oi, 50);
        assert_eq!(s.pcr, Some(0.5));
        assert_eq!(s.strikes, vec![100.0, 110.0]);
    }

    #[test]
    fn zero_call_oi_gives_no_pcr() {
        let s = analyze_chain(&[strike(100.0, None, Some(500))]);
        assert_eq!(s.total_call_oi, 0);
        assert_eq!(s.total_put_oi, 500);
        assert!(s.pcr.is_none());
    }

    #[test]
    fn empty_snapshot() {
        let s = analyze_chain(&[]);
        assert_eq!(s, OptionChainSummary::default());
    }

    #[test]
    fn pcr_is_exact_ratio() {
        assert_eq!(put_call_ratio(3, 7), Some(3.0 / 7.0));
    }

    #[test]
    fn parse_document_presence_checks() {
        let body = json!({
            "records": { "data": [
                { "strikePrice": 22000, "CE": { "openInterest": 100 } },
                { "strikePrice": 22100, "PE": { "openInterest": 50.0 } },
                { "expiryDate": "no strike here" },
                { "strikePrice": 22200, "CE": {}, "PE": { "openInterest": 7 } }
            ] }
        });
        let strikes = parse_chain_document(&body).unwrap();
        assert_eq!(strikes.len(), 3);
        assert_eq!(strikes[0], strike(22000.0, Some(100), None));
        assert_eq!(strikes[1], strike(22100.0, None, Some(50)));
        assert_eq!(strikes[2], strike(22200.0, None, Some(7)));

        let summary = analyze_chain(&strikes);
        assert_eq!(summary.total_call_oi, 100);
        assert_eq!(summary.total_put_oi, 57);
    }

    #[test]
    fn parse_document_without_records_fails() {
        assert!(parse_chain_document(&json!({ "filtered": {} })).is_err());
    }
}
