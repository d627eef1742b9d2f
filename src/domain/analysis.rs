//! Per-symbol analysis snapshot, recomputed on every evaluation.

use crate::domain::indicator::{self, DEFAULT_RSI_PERIOD};
use crate::domain::ohlcv::{closes, volumes, OhlcvBar, Quote};

pub const SHORT_MA_PERIOD: usize = 5;
pub const LONG_MA_PERIOD: usize = 20;
pub const VOLUME_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub symbol: String,
    pub current_price: i64,
    pub change_rate: f64,
    pub volume: i64,
    /// Mean volume of the last five bars.
    pub avg_volume: f64,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_ratio: f64,
}

impl Analysis {
    /// `bars` must be oldest first.
    pub fn from_market(quote: &Quote, bars: &[OhlcvBar]) -> Self {
        let closes = closes(bars);
        let volumes = volumes(bars);
        let recent_volumes = &volumes[volumes.len().saturating_sub(VOLUME_WINDOW)..];

        Analysis {
            symbol: quote.symbol.clone(),
            current_price: quote.current_price,
            change_rate: quote.change_rate,
            volume: quote.volume,
            avg_volume: indicator::mean(recent_volumes).unwrap_or(0.0),
            ma5: indicator::moving_average(&closes, SHORT_MA_PERIOD),
            ma20: indicator::moving_average(&closes, LONG_MA_PERIOD),
            rsi: indicator::rsi(&closes, DEFAULT_RSI_PERIOD),
            volume_ratio: indicator::volume_ratio(quote.volume as f64, recent_volumes),
        }
    }
}
