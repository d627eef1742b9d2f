//! RSI (Relative Strength Index).
//!
//! Gains and losses are simple means over the last `period` close-to-close
//! changes (no Wilder smoothing):
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Needs `period + 1` closes.

use super::mean;

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let window = &changes[changes.len() - period..];

    let gains: Vec<f64> = window.iter().map(|&c| if c > 0.0 { c } else { 0.0 }).collect();
    let losses: Vec<f64> = window.iter().map(|&c| if c < 0.0 { -c } else { 0.0 }).collect();

    let avg_gain = mean(&gains)?;
    let avg_loss = mean(&losses)?;

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
}
