// =============================================================================
// Market Data Module
// =============================================================================
//
// The price-history provider seam, its Yahoo adapter, the explicit series
// cache and the fixed-delay throttle used between upstream requests.
// =============================================================================

pub mod cache;
pub mod throttle;
pub mod yahoo;

pub use cache::{SeriesCache, SeriesKey};
pub use throttle::FixedDelayThrottle;
pub use yahoo::YahooChartClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PricePoint;

/// Source of daily price history. Implementations return rows oldest first;
/// an unknown symbol yields an error or an empty series.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, ticker: &str, period: &str, interval: &str) -> Result<Vec<PricePoint>>;
}
