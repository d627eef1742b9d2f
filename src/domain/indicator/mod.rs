//! Technical indicators.
//!
//! Pure functions over ordered (oldest first) numeric samples. Each returns the
//! value for the most recent point only, or `None` when the series is too
//! short to produce one.

pub mod rsi;
pub mod sma;
pub mod volume;

pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
pub use sma::moving_average;
pub use volume::volume_ratio;

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
