// =============================================================================
// Option-Chain HTTP Client
// =============================================================================
//
// Fetches the option chain for an index symbol (e.g. NIFTY). The upstream
// service rejects requests that do not look like they come from a browser, so
// every request carries browser-like User-Agent / Accept / Accept-Language
// headers.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{debug, instrument};

use super::analyzer::parse_chain_document;
use super::OptionChainProvider;
use crate::types::OptionStrike;

pub const DEFAULT_BASE_URL: &str = "https://www.nseindia.com";

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// REST client for the index option-chain endpoint.
#[derive(Debug, Clone)]
pub struct NseOptionChainClient {
    base_url: String,
    client: reqwest::Client,
}

impl NseOptionChainClient {
    /// Create a client against `base_url` with browser-like default headers.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client for option chain")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl OptionChainProvider for NseOptionChainClient {
    /// GET /api/option-chain-indices?symbol=<index>
    #[instrument(skip(self), name = "option_chain::fetch")]
    async fn fetch_chain(&self, index_symbol: &str) -> Result<Vec<OptionStrike>> {
        let url = format!("{}/api/option-chain-indices", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", index_symbol)])
            .send()
            .await
            .with_context(|| format!("GET option chain for {index_symbol}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse option-chain response")?;

        if !status.is_success() {
            anyhow::bail!("option-chain API returned {}: {}", status, body);
        }

        let strikes = parse_chain_document(&body)?;
        debug!(index_symbol, strikes = strikes.len(), "option chain fetched");
        Ok(strikes)
    }
}
