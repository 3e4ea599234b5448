// In-memory collaborators shared by the scanner and scan-job tests.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use parking_lot::Mutex;

use crate::market_data::PriceHistoryProvider;
use crate::option_chain::OptionChainProvider;
use crate::types::{OptionStrike, PricePoint};

/// Deterministic synthetic series per ticker, with tickers that fail, tickers
/// that come back empty, and tickers whose last close is NaN.
#[derive(Default)]
pub struct StubPrices {
    pub failing: HashSet<String>,
    pub empty: HashSet<String>,
    pub broken: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubPrices {
    pub fn failing(tickers: &[&str]) -> Self {
        Self {
            failing: tickers.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PriceHistoryProvider for StubPrices {
    async fn fetch_history(&self, ticker: &str, _period: &str, _interval: &str) -> anyhow::Result<Vec<PricePoint>> {
        self.calls.lock().push(ticker.to_string());
        if self.failing.contains(ticker) {
            anyhow::bail!("upstream returned 404 for {ticker}");
        }
        if self.empty.contains(ticker) {
            return Ok(Vec::new());
        }

        let seed = ticker.bytes().map(u64::from).sum::<u64>() as f64;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let broken = self.broken.contains(ticker);
        Ok((0..60u64)
            .map(|i| {
                let c = if broken && i == 59 {
                    f64::NAN
                } else {
                    100.0 + seed % 17.0 + ((i as f64) * 0.7 + seed).sin() * 3.0
                };
                PricePoint {
                    date: start + Days::new(i),
                    open: c,
                    high: c + 1.0,
                    low: c - 1.0,
                    close: c,
                    volume: 1_000 + i,
                }
            })
            .collect())
    }
}

/// Fixed snapshot, or a rejection when `None`.
pub struct StubChain(pub Option<Vec<OptionStrike>>);

#[async_trait]
impl OptionChainProvider for StubChain {
    async fn fetch_chain(&self, index_symbol: &str) -> anyhow::Result<Vec<OptionStrike>> {
        match &self.0 {
            Some(s) => Ok(s.clone()),
            None => anyhow::bail!("{index_symbol} chain rejected"),
        }
    }
}

/// `{CE.openInterest=100}, {PE.openInterest=50}`.
pub fn two_strike_chain() -> StubChain {
    StubChain(Some(vec![
        OptionStrike {
            strike_price: 22000.0,
            call_open_interest: Some(100),
            put_open_interest: None,
        },
        OptionStrike {
            strike_price: 22100.0,
            call_open_interest: None,
            put_open_interest: Some(50),
        },
    ]))
}
