// =============================================================================
// Option Chain Module
// =============================================================================
//
// Fetching (`client`) is kept apart from aggregation (`analyzer`) so the
// put/call arithmetic stays a pure function over an in-memory snapshot.

pub mod analyzer;
pub mod client;

pub use analyzer::{analyze_chain, OptionChainSummary};
pub use client::NseOptionChainClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::OptionStrike;

/// Source of option-chain snapshots keyed by index symbol.
#[async_trait]
pub trait OptionChainProvider: Send + Sync {
    async fn fetch_chain(&self, index_symbol: &str) -> Result<Vec<OptionStrike>>;
}
