// =============================================================================
// Series Cache — fetched price history keyed by (ticker, period, interval)
// =============================================================================
//
// Explicit and owned by the application state. Nothing expires on its own: a
// scan with `refresh` set, or the invalidate endpoint, decides when a series
// is fetched again.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::PricePoint;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Composite key that identifies one fetched price series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub ticker: String,
    pub period: String,
    pub interval: String,
}

impl SeriesKey {
    pub fn new(ticker: impl Into<String>, period: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            period: period.into(),
            interval: interval.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}/{}", self.ticker, self.period, self.interval)
    }
}

#[derive(Debug, Clone)]
struct CachedSeries {
    points: Arc<Vec<PricePoint>>,
    fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SeriesCache -- explicit, caller-invalidated cache of fetched series
// ---------------------------------------------------------------------------

/// Thread-safe store of fetched price series per `(ticker, period, interval)`.
///
/// Entries never expire on their own; callers decide when to invalidate.
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: RwLock<HashMap<SeriesKey, CachedSeries>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached series for `key`, if present.
    pub fn get(&self, key: &SeriesKey) -> Option<Arc<Vec<PricePoint>>> {
        self.entries.read().get(key).map(|c| c.points.clone())
    }

    /// Time the series for `key` was stored.
    pub fn fetched_at(&self, key: &SeriesKey) -> Option<DateTime<Utc>> {
        self.entries.read().get(key).map(|c| c.fetched_at)
    }

    /// Store (or replace) the series for `key` and return the shared handle.
    pub fn insert(&self, key: SeriesKey, points: Vec<PricePoint>) -> Arc<Vec<PricePoint>> {
        let points = Arc::new(points);
        debug!(key = %key, rows = points.len(), "series cached");
        self.entries.write().insert(
            key,
            CachedSeries {
                points: points.clone(),
                fetched_at: Utc::now(),
            },
        );
        points
    }

    /// Most recently stored series for `ticker`, whatever its period/interval.
    pub fn latest_for_ticker(&self, ticker: &str) -> Option<(SeriesKey, Arc<Vec<PricePoint>>)> {
        self.entries
            .read()
            .iter()
            .filter(|(k, _)| k.ticker == ticker)
            .max_by_key(|(_, c)| c.fetched_at)
            .map(|(k, c)| (k.clone(), c.points.clone()))
    }

    /// Drop one series. Returns `true` if it was cached.
    pub fn invalidate(&self, key: &SeriesKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every series for `ticker`. Returns how many were removed.
    pub fn invalidate_ticker(&self, ticker: &str) -> usize {
        let mut map = self.entries.write();
        let before = map.len();
        map.retain(|k, _| k.ticker != ticker);
        before - map.len()
    }

    /// Drop everything. Returns how many series were removed.
    pub fn clear(&self) -> usize {
        let mut map = self.entries.write();
        let n = map.len();
        map.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn insert_then_get() {
        let cache = SeriesCache::new();
        let key = SeriesKey::new("TCS.NS", "6mo", "1d");
        assert!(cache.get(&key).is_none());

        cache.insert(key.clone(), vec![point(1.0), point(2.0)]);
        assert_eq!(cache.get(&key).unwrap().len(), 2);
        assert!(cache.fetched_at(&key).is_some());
    }

    #[test]
    fn keys_differ_by_period_and_interval() {
        let cache = SeriesCache::new();
        cache.insert(SeriesKey::new("INFY.NS", "6mo", "1d"), vec![point(1.0)]);
        assert!(cache.get(&SeriesKey::new("INFY.NS", "1y", "1d")).is_none());
        assert!(cache.get(&SeriesKey::new("INFY.NS", "6mo", "1wk")).is_none());
    }

    #[test]
    fn invalidation() {
        let cache = SeriesCache::new();
        let a = SeriesKey::new("A", "6mo", "1d");
        cache.insert(a.clone(), vec![point(1.0)]);
        cache.insert(SeriesKey::new("A", "1y", "1d"), vec![point(1.0)]);
        cache.insert(SeriesKey::new("B", "6mo", "1d"), vec![point(1.0)]);

        assert!(cache.invalidate(&a));
        assert!(!cache.invalidate(&a));
        assert_eq!(cache.invalidate_ticker("A"), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn latest_for_ticker_finds_any_period() {
        let cache = SeriesCache::new();
        cache.insert(SeriesKey::new("A", "1y", "1d"), vec![point(3.0)]);
        let (key, points) = cache.latest_for_ticker("A").unwrap();
        assert_eq!(key.period, "1y");
        assert_eq!(points[0].close, 3.0);
        assert!(cache.latest_for_ticker("B").is_none());
    }
}
