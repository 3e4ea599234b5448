// =============================================================================
// Yahoo Finance Chart Client — daily price history
// =============================================================================
//
// GET /v8/finance/chart/{ticker}?range=<period>&interval=<interval>
//
// The chart endpoint returns parallel arrays (timestamp, open, high, low,
// close, volume); rows where any OHLC value is null are dropped. Unknown
// symbols come back either as an HTTP error or as an empty `result`, both of
// which surface as an error for that ticker.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::PriceHistoryProvider;
use crate::types::PricePoint;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Price-history client for the Yahoo chart API.
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client for price history")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooChartClient {
    #[instrument(skip(self), name = "yahoo::fetch_history")]
    async fn fetch_history(&self, ticker: &str, period: &str, interval: &str) -> Result<Vec<PricePoint>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        let resp = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await
            .with_context(|| format!("GET chart for {ticker}"))?;

        let status = resp.status();
        let body: ChartResponse = resp
            .json()
            .await
            .with_context(|| format!("failed to parse chart response for {ticker} (HTTP {status})"))?;

        let points = parse_chart(body)?;
        debug!(ticker, period, interval, rows = points.len(), "price history fetched");
        Ok(points)
    }
}

/// Turn the parallel-array chart payload into ordered price rows.
fn parse_chart(body: ChartResponse) -> Result<Vec<PricePoint>> {
    if let Some(err) = body.chart.error {
        anyhow::bail!("chart API error {}: {}", err.code, err.description);
    }

    let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            DateTime::from_timestamp(ts, 0),
        );

        let (Some(open), Some(high), Some(low), Some(close), Some(at)) = row else {
            dropped += 1;
            continue;
        };

        points.push(PricePoint {
            date: at.date_naive(),
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if dropped > 0 {
        warn!(dropped, "skipped chart rows with missing prices");
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}
