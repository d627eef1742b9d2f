//! OHLCV bar and quote snapshots.
//!
//! Bar sequences handed to the domain are chronological ascending: the most
//! recent bar is last.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
}

/// Current price snapshot for one symbol, created per fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub current_price: i64,
    /// Change versus the previous close, in percent.
    pub change_rate: f64,
    pub volume: i64,
}

/// Closing prices as `f64`, preserving order.
pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close as f64).collect()
}

/// Volumes as `f64`, preserving order.
pub fn volumes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume as f64).collect()
}
