use chrono::Utc;
use serde::Serialize;
use thiserror::Error as ThisError;

/// Why a scan (or one ticker inside it) did not produce output.
#[derive(ThisError, Debug)]
pub enum ScanError {
    #[error("fetch failed for {ticker}: {reason}")]
    FetchFailure { ticker: String, reason: String },

    #[error("computation failed for {ticker}: {reason}")]
    ComputationFailure { ticker: String, reason: String },

    #[error("no data available: all {attempted} tickers failed")]
    TotalDataUnavailable {
        attempted: usize,
        diagnostics: Vec<ScanDiagnostic>,
    },

    #[error("a scan is already running")]
    ScanInProgress,
}

impl ScanError {
    pub fn fetch(ticker: &str, reason: impl std::fmt::Display) -> Self {
        Self::FetchFailure {
            ticker: ticker.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn computation(ticker: &str, reason: impl std::fmt::Display) -> Self {
        Self::ComputationFailure {
            ticker: ticker.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Diagnostic record for a per-ticker failure.
    pub fn to_diagnostic(&self) -> ScanDiagnostic {
        match self {
            Self::FetchFailure { ticker, .. } => {
                ScanDiagnostic::new(DiagnosticKind::FetchFailure, Some(ticker.clone()), self.to_string())
            }
            Self::ComputationFailure { ticker, .. } => ScanDiagnostic::new(
                DiagnosticKind::ComputationFailure,
                Some(ticker.clone()),
                self.to_string(),
            ),
            Self::TotalDataUnavailable { .. } => {
                ScanDiagnostic::new(DiagnosticKind::TotalDataUnavailable, None, self.to_string())
            }
            Self::ScanInProgress => ScanDiagnostic::new(DiagnosticKind::ScanRejected, None, self.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    FetchFailure,
    ComputationFailure,
    TotalDataUnavailable,
    OptionChainUnavailable,
    ExportFailure,
    EmailFailure,
    ScanRejected,
}

/// A human-readable problem surfaced to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ScanDiagnostic {
    pub kind: DiagnosticKind,
    pub ticker: Option<String>,
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

impl ScanDiagnostic {
    pub fn new(kind: DiagnosticKind, ticker: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            ticker,
            message: message.into(),
            at: Utc::now().to_rfc3339(),
        }
    }
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_ticker_diagnostics_carry_ticker() {
        let d = ScanError::fetch("TCS.NS", "timeout").to_diagnostic();
        assert_eq!(d.kind, DiagnosticKind::FetchFailure);
        assert_eq!(d.ticker.as_deref(), Some("TCS.NS"));
        assert_eq!(d.message, "fetch failed for TCS.NS: timeout");

        let d = ScanError::computation("INFY.NS", "no rows").to_diagnostic();
        assert_eq!(d.kind, DiagnosticKind::ComputationFailure);
    }

    #[test]
    fn total_failure_has_no_ticker() {
        let e = ScanError::TotalDataUnavailable {
            attempted: 5,
            diagnostics: Vec::new(),
        };
        assert_eq!(e.to_string(), "no data available: all 5 tickers failed");
        assert!(e.to_diagnostic().ticker.is_none());
    }
}
