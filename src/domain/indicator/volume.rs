//! Volume ratio: current volume relative to the mean of a recent window.

use super::mean;

/// `current_volume / mean(recent_volumes)`, or 0 when the mean is 0 or the
/// window is empty.
pub fn volume_ratio(current_volume: f64, recent_volumes: &[f64]) -> f64 {
    match mean(recent_volumes) {
        Some(avg) if avg > 0.0 => current_volume / avg,
        _ => 0.0,
    }
}
