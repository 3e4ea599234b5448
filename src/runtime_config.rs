// =============================================================================
// Runtime Configuration — scanner settings with atomic save
// =============================================================================
//
// Every tunable of the scanner lives here: the ticker list, the option-chain
// index, history window, scoring choices, throttle delay, export directory and
// the non-secret half of the SMTP relay settings.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// SMTP credentials are deliberately absent: they come from the environment.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::export::SmtpSettings;
use crate::market_data::yahoo;
use crate::option_chain::client as option_chain_client;
use crate::types::{ScoringStrategy, VolatilityMode};
use crate::watchlist::builder::DEFAULT_TOP_N;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_tickers() -> Vec<String> {
    vec![
        "RELIANCE.NS".to_string(),
        "TCS.NS".to_string(),
        "INFY.NS".to_string(),
        "HDFCBANK.NS".to_string(),
        "ICICIBANK.NS".to_string(),
    ]
}

fn default_index_symbol() -> String {
    "NIFTY".to_string()
}

fn default_period() -> String {
    "6mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_throttle_ms() -> u64 {
    1000
}

fn default_export_dir() -> String {
    "exports".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_price_base_url() -> String {
    yahoo::DEFAULT_BASE_URL.to_string()
}

fn default_option_chain_base_url() -> String {
    option_chain_client::DEFAULT_BASE_URL.to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Universe -----------------------------------------------------------

    /// Tickers scanned on every run, in scan order.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    /// Index whose option chain supplies OI / PCR. Empty disables it.
    #[serde(default = "default_index_symbol")]
    pub index_symbol: String,

    /// History range requested from the price provider (e.g. "6mo").
    #[serde(default = "default_period")]
    pub period: String,

    /// Bar interval requested from the price provider (e.g. "1d").
    #[serde(default = "default_interval")]
    pub interval: String,

    // --- Scoring ------------------------------------------------------------

    #[serde(default)]
    pub volatility_mode: VolatilityMode,

    /// Which score ranks the watchlist.
    #[serde(default)]
    pub scoring_strategy: ScoringStrategy,

    /// How many ranked entries are exposed as top opportunities.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    // --- Upstream -----------------------------------------------------------

    /// Fixed delay between upstream requests (milliseconds).
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    #[serde(default = "default_price_base_url")]
    pub price_base_url: String,

    #[serde(default = "default_option_chain_base_url")]
    pub option_chain_base_url: String,

    // --- Output -------------------------------------------------------------

    /// Directory receiving one CSV per scan.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    #[serde(default)]
    pub smtp: SmtpSettings,

    // --- Service ------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Run one scan as soon as the service starts.
    #[serde(default)]
    pub scan_on_startup: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            index_symbol: default_index_symbol(),
            period: default_period(),
            interval: default_interval(),
            volatility_mode: VolatilityMode::default(),
            scoring_strategy: ScoringStrategy::default(),
            top_n: default_top_n(),
            throttle_ms: default_throttle_ms(),
            price_base_url: default_price_base_url(),
            option_chain_base_url: default_option_chain_base_url(),
            export_dir: default_export_dir(),
            smtp: SmtpSettings::default(),
            bind_addr: default_bind_addr(),
            scan_on_startup: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;
        config.normalize();

        info!(
            path = %path.display(),
            tickers = ?config.tickers,
            index = %config.index_symbol,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Upper-case and trim tickers and the index symbol so they match the
    /// keys used by the series cache and the dashboard endpoints.
    pub fn normalize(&mut self) {
        self.tickers = self
            .tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        self.index_symbol = self.index_symbol.trim().to_uppercase();
    }

    /// Runtime copy of this config with environment overrides applied.
    /// `self` stays as loaded from disk, so saving it never persists a
    /// one-off override.
    pub fn with_overrides(&self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut effective = self.clone();
        effective.apply_overrides(lookup);
        effective
    }

    /// Apply `WATCHLIST_*` environment overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(tickers) = lookup("WATCHLIST_TICKERS") {
            let parsed = parse_ticker_list(&tickers);
            if !parsed.is_empty() {
                self.tickers = parsed;
            }
        }
        if let Some(index) = lookup("WATCHLIST_INDEX_SYMBOL") {
            self.index_symbol = index.trim().to_uppercase();
        }
        if let Some(addr) = lookup("WATCHLIST_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(flag) = lookup("WATCHLIST_SCAN_ON_START") {
            self.scan_on_startup = matches!(flag.trim(), "1" | "true" | "yes");
        }
    }

    /// Index symbol, or `None` when the option chain is disabled.
    pub fn index(&self) -> Option<&str> {
        let s = self.index_symbol.trim();
        (!s.is_empty()).then_some(s)
    }
}

/// Split a comma-separated ticker list, trimming and upper-casing each entry.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.tickers.len(), 5);
        assert_eq!(cfg.tickers[0], "RELIANCE.NS");
        assert_eq!(cfg.index_symbol, "NIFTY");
        assert_eq!(cfg.period, "6mo");
        assert_eq!(cfg.interval, "1d");
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.volatility_mode, VolatilityMode::Rolling { window: 20 });
        assert_eq!(cfg.scoring_strategy, ScoringStrategy::RuleTable);
        assert_eq!(cfg.smtp.port, 587);
        assert!(!cfg.scan_on_startup);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.tickers, default_tickers());
        assert_eq!(cfg.throttle_ms, 1000);
        assert_eq!(cfg.export_dir, "exports");
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "tickers": ["SBIN.NS"],
            "scoring_strategy": "momentum",
            "volatility_mode": { "kind": "annualized" },
            "smtp": { "host": "mail.example.com" }
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.tickers, vec!["SBIN.NS"]);
        assert_eq!(cfg.scoring_strategy, ScoringStrategy::Momentum);
        assert_eq!(cfg.volatility_mode, VolatilityMode::Annualized);
        assert_eq!(cfg.smtp.host, "mail.example.com");
        assert_eq!(cfg.smtp.port, 587);
        assert_eq!(cfg.top_n, 5);
    }

    #[test]
    fn roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("watchlist-config-{}.json", uuid::Uuid::new_v4()));
        let mut cfg = RuntimeConfig::default();
        cfg.tickers = vec!["WIPRO.NS".into()];
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.tickers, cfg.tickers);
        assert_eq!(loaded.index_symbol, cfg.index_symbol);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_error() {
        assert!(RuntimeConfig::load("/nonexistent/watchlist_config.json").is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WATCHLIST_TICKERS", " sbin.ns, ,itc.ns "),
            ("WATCHLIST_INDEX_SYMBOL", "banknifty"),
            ("WATCHLIST_SCAN_ON_START", "true"),
        ]
        .into_iter()
        .collect();

        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.tickers, vec!["SBIN.NS", "ITC.NS"]);
        assert_eq!(cfg.index_symbol, "BANKNIFTY");
        assert!(cfg.scan_on_startup);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn overrides_are_not_persisted() {
        let path = std::env::temp_dir().join(format!("watchlist-config-{}.json", uuid::Uuid::new_v4()));
        RuntimeConfig::default().save(&path).unwrap();

        let on_disk = RuntimeConfig::load(&path).unwrap();
        let effective = on_disk.with_overrides(|k| (k == "WATCHLIST_TICKERS").then(|| "SBIN.NS".to_string()));
        assert_eq!(effective.tickers, vec!["SBIN.NS"]);

        on_disk.save(&path).unwrap();
        let reloaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(reloaded.tickers, default_tickers());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_normalizes_ticker_case() {
        let path = std::env::temp_dir().join(format!("watchlist-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "tickers": [" reliance.ns", "", "Tcs.NS"], "index_symbol": "nifty " }"#).unwrap();

        let cfg = RuntimeConfig::load(&path).unwrap();
        assert_eq!(cfg.tickers, vec!["RELIANCE.NS", "TCS.NS"]);
        assert_eq!(cfg.index_symbol, "NIFTY");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn blank_index_disables_option_chain() {
        let mut cfg = RuntimeConfig::default();
        assert_eq!(cfg.index(), Some("NIFTY"));
        cfg.index_symbol = "  ".into();
        assert!(cfg.index().is_none());
    }
}
