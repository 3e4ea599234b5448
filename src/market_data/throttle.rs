// =============================================================================
// Fixed-Interval Throttle — spaces out upstream requests between tickers
// =============================================================================
//
// The scanner awaits `pause()` between tickers. The delay is constant: there
// is no adaptive backoff and no retry. A counter of pauses taken is kept so
// the dashboard can show how much of a scan was spent waiting.
// =============================================================================

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Constant delay between per-ticker iterations.
pub struct FixedDelayThrottle {
    delay: Duration,
    pauses: AtomicU32,
}

/// Serialisable view of the throttle.
#[derive(Debug, Clone, Serialize)]
pub struct ThrottleSnapshot {
    pub delay_ms: u64,
    pub pauses: u32,
}

impl FixedDelayThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pauses: AtomicU32::new(0),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Sleep for the configured delay. A zero delay returns immediately.
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        self.pauses.fetch_add(1, Ordering::Relaxed);
        debug!(delay_ms = self.delay.as_millis() as u64, "throttling before next ticker");
        tokio::time::sleep(self.delay).await;
    }

    pub fn snapshot(&self) -> ThrottleSnapshot {
        ThrottleSnapshot {
            delay_ms: self.delay.as_millis() as u64,
            pauses: self.pauses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for FixedDelayThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedDelayThrottle")
            .field("delay", &self.delay)
            .field("pauses", &self.pauses.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_delay_does_not_count() {
        let t = FixedDelayThrottle::from_millis(0);
        t.pause().await;
        assert_eq!(t.snapshot().pauses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_waits_for_delay() {
        let t = FixedDelayThrottle::from_millis(250);
        let start = tokio::time::Instant::now();
        t.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(t.snapshot().pauses, 1);
        assert_eq!(t.snapshot().delay_ms, 250);
    }
}
