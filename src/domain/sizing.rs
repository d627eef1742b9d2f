//! Position sizing.
//!
//! The investable share of cash is split evenly across the configured maximum
//! number of positions, regardless of how many are currently open:
//!
//! quantity = floor(cash * max_invest_ratio / max_position_count / price)

pub fn position_size(
    current_price: i64,
    available_cash: i64,
    max_invest_ratio: f64,
    max_position_count: usize,
) -> u64 {
    if current_price <= 0 || available_cash <= 0 || max_position_count == 0 {
        return 0;
    }

    let max_invest_amount = available_cash as f64 * max_invest_ratio;
    let per_position = max_invest_amount / max_position_count as f64;
    let quantity = (per_position / current_price as f64).floor();

    if quantity.is_finite() && quantity > 0.0 {
        quantity as u64
    } else {
        0
    }
}
