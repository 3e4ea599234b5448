// =============================================================================
// Central Application State — Watchlist Scanner
// =============================================================================
//
// Ties together configuration, the upstream providers, the explicit series
// cache, the last finished scan and the diagnostics log. The presentation
// layer never drives a scan itself: it reads the latest report and subscribes
// to scan events.
//
// Thread safety:
//   - Atomic counters / flags for version tracking and the one-scan-at-a-time
//     guard.
//   - parking_lot::RwLock for all mutable shared data.
//   - tokio broadcast channel for finished-scan events.
// =============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::ScanDiagnostic;
use crate::market_data::{PriceHistoryProvider, SeriesCache};
use crate::option_chain::OptionChainProvider;
use crate::runtime_config::RuntimeConfig;
use crate::watchlist::{ScanEvent, ScanReport};

/// Maximum number of recent diagnostics to retain.
const MAX_RECENT_ERRORS: usize = 50;
/// Buffered events per subscriber before slow receivers start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Central application state shared across tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented on every meaningful state mutation.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Upstream ────────────────────────────────────────────────────────
    pub price_provider: Arc<dyn PriceHistoryProvider>,
    pub option_chain_provider: Arc<dyn OptionChainProvider>,
    pub series_cache: Arc<SeriesCache>,

    // ── Results ─────────────────────────────────────────────────────────
    pub latest_report: RwLock<Option<Arc<ScanReport>>>,
    pub recent_errors: RwLock<Vec<ScanDiagnostic>>,

    // ── Scan coordination ───────────────────────────────────────────────
    scan_running: AtomicBool,
    events: broadcast::Sender<ScanEvent>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

/// Held for the duration of a scan; releases the scan slot on drop.
pub struct ScanGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Lightweight status payload for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state_version: u64,
    pub scan_running: bool,
    pub last_scan_id: Option<String>,
    pub cached_series: usize,
    pub recent_errors: usize,
    pub uptime_secs: u64,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        price_provider: Arc<dyn PriceHistoryProvider>,
        option_chain_provider: Arc<dyn OptionChainProvider>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            price_provider,
            option_chain_provider,
            series_cache: Arc::new(SeriesCache::new()),
            latest_report: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            scan_running: AtomicBool::new(false),
            events,
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Scan coordination ───────────────────────────────────────────────

    /// Claim the single scan slot. `None` if a scan is already running.
    pub fn try_begin_scan(&self) -> Option<ScanGuard<'_>> {
        self.scan_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| ScanGuard {
                flag: &self.scan_running,
            })
    }

    pub fn is_scan_running(&self) -> bool {
        self.scan_running.load(Ordering::SeqCst)
    }

    // ── Events ──────────────────────────────────────────────────────────

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Broadcast `event` to every subscriber. Having no subscribers is fine.
    pub fn publish(&self, event: ScanEvent) {
        let receivers = self.events.send(event).unwrap_or(0);
        debug!(receivers, "scan event published");
        self.increment_version();
    }

    // ── Results ─────────────────────────────────────────────────────────

    pub fn set_latest_report(&self, report: Arc<ScanReport>) {
        *self.latest_report.write() = Some(report);
        self.increment_version();
    }

    pub fn latest_report(&self) -> Option<Arc<ScanReport>> {
        self.latest_report.read().clone()
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record a diagnostic. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted first.
    pub fn push_diagnostic(&self, diagnostic: ScanDiagnostic) {
        let mut errors = self.recent_errors.write();
        errors.push(diagnostic);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            state_version: self.current_state_version(),
            scan_running: self.is_scan_running(),
            last_scan_id: self.latest_report().map(|r| r.watchlist.scan_id.clone()),
            cached_series: self.series_cache.len(),
            recent_errors: self.recent_errors.read().len(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}
