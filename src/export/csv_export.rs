// =============================================================================
// CSV Export — one file per scan, one row per watchlist entry
// =============================================================================
//
// File name: watchlist_<YYYY-MM-DD>.csv
// The header row is always written, so an empty scan still produces a valid
// file. Missing values are written as empty cells.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::Writer;
use tracing::info;

use crate::types::WatchlistEntry;

pub const CSV_HEADER: [&str; 14] = [
    "ticker",
    "last_close",
    "volume",
    "volatility",
    "rsi",
    "macd",
    "signal",
    "support",
    "resistance",
    "call_oi",
    "put_oi",
    "pcr",
    "score",
    "opportunity_score",
];

/// File name for a scan run on `date`.
pub fn csv_file_name(date: NaiveDate) -> String {
    format!("watchlist_{}.csv", date.format("%Y-%m-%d"))
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record(entry: &WatchlistEntry) -> [String; 14] {
    [
        entry.ticker.clone(),
        cell(entry.last_close),
        cell(entry.volume),
        cell(entry.volatility),
        cell(entry.rsi),
        cell(entry.macd),
        cell(entry.signal),
        cell(entry.support),
        cell(entry.resistance),
        cell(entry.call_oi),
        cell(entry.put_oi),
        cell(entry.pcr),
        entry.score.to_string(),
        cell(entry.opportunity_score),
    ]
}

/// Write the header and every entry to `out`.
pub fn write_watchlist<W: Write>(out: W, entries: &[WatchlistEntry]) -> Result<()> {
    let mut writer = Writer::from_writer(out);

    writer
        .write_record(CSV_HEADER)
        .context("failed to write CSV header")?;
    for entry in entries {
        writer
            .write_record(record(entry))
            .with_context(|| format!("failed to write CSV row for {}", entry.ticker))?;
    }
    writer.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Render the watchlist into an in-memory CSV document.
pub fn render_watchlist(entries: &[WatchlistEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_watchlist(&mut buf, entries)?;
    Ok(buf)
}

/// Write `entries` to `<dir>/watchlist_<date>.csv`, creating `dir` if needed.
pub fn export_watchlist(dir: impl AsRef<Path>, date: NaiveDate, entries: &[WatchlistEntry]) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;

    let path = dir.join(csv_file_name(date));
    let file = fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_watchlist(file, entries)?;

    info!(path = %path.display(), rows = entries.len(), "watchlist exported");
    Ok(path)
}
