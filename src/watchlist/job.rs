// =============================================================================
// Scan Job — one on-demand run: scan → CSV → optional email → publish
// =============================================================================
//
// The only place that drives a scan. Invoked by `POST /api/v1/scan` and, when
// configured, once at startup. Only one job runs at a time; a second trigger
// is rejected with `ScanInProgress`.
//
// A failed export or email does not fail the job: the watchlist is still
// stored and published, with the problem attached as a diagnostic.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{ScanSettings, Scanner, Watchlist};
use crate::app_state::AppState;
use crate::error::{DiagnosticKind, ScanDiagnostic, ScanError, ScanResult};
use crate::export::email::{build_report_message, send_message, sender_address};
use crate::export::{csv_file_name, export_watchlist, render_watchlist, SmtpCredentials, SmtpSettings};
use crate::market_data::throttle::ThrottleSnapshot;
use crate::market_data::FixedDelayThrottle;
use crate::runtime_config::RuntimeConfig;
use crate::types::{ScoringStrategy, WatchlistEntry};

/// Body of `POST /api/v1/scan`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    /// Overrides the configured index; an empty string skips the option chain.
    #[serde(default)]
    pub index_symbol: Option<String>,
    /// Ignore cached series and fetch everything again.
    #[serde(default)]
    pub refresh: bool,
    #[serde(default)]
    pub strategy: Option<ScoringStrategy>,
    #[serde(default)]
    pub email: Option<EmailRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailRequest {
    pub recipients: Vec<String>,
}

/// Everything a finished job produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub watchlist: Watchlist,
    pub top_opportunities: Vec<WatchlistEntry>,
    pub csv_path: Option<String>,
    pub emailed_to: Vec<String>,
    pub throttle: ThrottleSnapshot,
}

/// Pushed to every dashboard subscriber when a job ends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Finished {
        report: Arc<ScanReport>,
    },
    Failed {
        message: String,
        diagnostics: Vec<ScanDiagnostic>,
    },
}

/// Resolve the scan settings from the current config plus the request.
pub fn resolve_settings(config: &RuntimeConfig, request: &ScanRequest) -> ScanSettings {
    let index_symbol = match &request.index_symbol {
        Some(s) => {
            let s = s.trim().to_uppercase();
            (!s.is_empty()).then_some(s)
        }
        None => config.index().map(str::to_string),
    };

    ScanSettings {
        tickers: config.tickers.clone(),
        period: config.period.clone(),
        interval: config.interval.clone(),
        index_symbol,
        volatility_mode: config.volatility_mode,
        strategy: request.strategy.unwrap_or(config.scoring_strategy),
        top_n: config.top_n,
        refresh: request.refresh,
    }
}

/// Run one scan job end to end.
pub async fn run_scan(state: &AppState, request: ScanRequest) -> ScanResult<Arc<ScanReport>> {
    let Some(_guard) = state.try_begin_scan() else {
        warn!("scan rejected — another scan is running");
        return Err(ScanError::ScanInProgress);
    };

    let (settings, throttle_ms, export_dir, smtp) = {
        let config = state.runtime_config.read();
        (
            resolve_settings(&config, &request),
            config.throttle_ms,
            config.export_dir.clone(),
            config.smtp.clone(),
        )
    };

    let throttle = FixedDelayThrottle::from_millis(throttle_ms);
    let scanner = Scanner::new(
        state.price_provider.as_ref(),
        state.option_chain_provider.as_ref(),
        &state.series_cache,
        &throttle,
    );

    let mut watchlist = match scanner.run(&settings).await {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "scan failed — nothing exported");
            let mut diagnostics = match &e {
                ScanError::TotalDataUnavailable { diagnostics, .. } => diagnostics.clone(),
                _ => Vec::new(),
            };
            diagnostics.push(e.to_diagnostic());
            for d in &diagnostics {
                state.push_diagnostic(d.clone());
            }
            state.publish(ScanEvent::Failed {
                message: e.to_string(),
                diagnostics,
            });
            return Err(e);
        }
    };

    // ── CSV ─────────────────────────────────────────────────────────────
    let csv_path = match export_watchlist(&export_dir, watchlist.scan_date, &watchlist.entries) {
        Ok(path) => Some(path.display().to_string()),
        Err(e) => {
            warn!(error = %e, "CSV export failed");
            watchlist.diagnostics.push(ScanDiagnostic::new(
                DiagnosticKind::ExportFailure,
                None,
                format!("{e:#}"),
            ));
            None
        }
    };

    // ── Email ───────────────────────────────────────────────────────────
    let mut emailed_to = Vec::new();
    if let Some(email) = request.email.as_ref().filter(|e| !e.recipients.is_empty()) {
        match email_report(&smtp, &email.recipients, &watchlist).await {
            Ok(()) => emailed_to = email.recipients.clone(),
            Err(e) => {
                warn!(error = %e, "report email failed");
                watchlist.diagnostics.push(ScanDiagnostic::new(
                    DiagnosticKind::EmailFailure,
                    None,
                    format!("{e:#}"),
                ));
            }
        }
    }

    for d in &watchlist.diagnostics {
        state.push_diagnostic(d.clone());
    }

    let report = Arc::new(ScanReport {
        top_opportunities: watchlist.top_opportunities().to_vec(),
        watchlist,
        csv_path,
        emailed_to,
        throttle: throttle.snapshot(),
    });

    state.set_latest_report(report.clone());
    state.publish(ScanEvent::Finished {
        report: report.clone(),
    });

    info!(
        scan_id = %report.watchlist.scan_id,
        rows = report.watchlist.entries.len(),
        csv = ?report.csv_path,
        emailed = report.emailed_to.len(),
        "scan job complete"
    );

    Ok(report)
}

/// Run the job on its own task. Dropping the handle (for example when the
/// HTTP client that triggered it disconnects) does not cancel the scan.
pub fn spawn_scan(state: Arc<AppState>, request: ScanRequest) -> JoinHandle<ScanResult<Arc<ScanReport>>> {
    tokio::spawn(async move { run_scan(&state, request).await })
}

async fn email_report(smtp: &SmtpSettings, recipients: &[String], watchlist: &Watchlist) -> anyhow::Result<()> {
    let credentials = SmtpCredentials::from_env()
        .context("SMTP_USERNAME / SMTP_PASSWORD not set; cannot send report email")?;

    let file_name = csv_file_name(watchlist.scan_date);
    let csv = render_watchlist(&watchlist.entries)?;
    let body = format!(
        "Options watchlist for {} ({} tickers ranked by {}).",
        watchlist.scan_date,
        watchlist.entries.len(),
        watchlist.strategy
    );

    let message = build_report_message(
        &sender_address(smtp, &credentials),
        recipients,
        &format!("Options Watchlist {}", watchlist.scan_date),
        &body,
        &file_name,
        csv,
    )?;

    send_message(smtp, &credentials, message).await
}
