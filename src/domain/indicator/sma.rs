//! Simple moving average of the last `period` closes.

use super::mean;

pub fn moving_average(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    mean(&closes[closes.len() - period..])
}
