//! Strategy parameters.

use std::fmt;
use std::time::Duration;

/// Bar period requested from the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ChartPeriod {
    pub fn code(&self) -> &'static str {
        match self {
            ChartPeriod::Daily => "D",
            ChartPeriod::Weekly => "W",
            ChartPeriod::Monthly => "M",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "D" => Some(ChartPeriod::Daily),
            "W" => Some(ChartPeriod::Weekly),
            "M" => Some(ChartPeriod::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub watchlist: Vec<String>,
    pub max_position_count: usize,
    pub max_invest_ratio: f64,
    pub stop_loss_ratio: f64,
    pub take_profit_ratio: f64,
    pub chart_period: ChartPeriod,
    pub chart_count: usize,
    /// Pause after every submitted order, to stay under the broker's rate limit.
    pub order_delay: Duration,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            watchlist: Vec::new(),
            max_position_count: 5,
            max_invest_ratio: 0.8,
            stop_loss_ratio: 0.05,
            take_profit_ratio: 0.1,
            chart_period: ChartPeriod::Daily,
            chart_count: 30,
            order_delay: Duration::from_secs(1),
        }
    }
}
