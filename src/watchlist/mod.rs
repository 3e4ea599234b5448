// =============================================================================
// Watchlist — per-ticker entries, the sequential scanner, and the scan job
// =============================================================================

pub mod builder;
pub mod job;
pub mod scanner;

#[cfg(test)]
pub mod test_support;

pub use job::{spawn_scan, ScanEvent, ScanReport, ScanRequest};
pub use scanner::{ScanSettings, Scanner, Watchlist};
