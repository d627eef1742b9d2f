//! Buy/sell rule evaluation.
//!
//! # Evaluation Semantics
//!
//! - Buy: needs ma5, ma20 and rsi. Fires when at least 3 of the 4 entry
//!   conditions hold (quorum).
//! - Sell: needs an open holding. Fires when any of the 4 exit conditions
//!   holds. Missing indicators only disable their own condition.
//!
//! Entries are cautious and exits are fast; the asymmetry is the risk policy.

use crate::domain::analysis::Analysis;
use crate::domain::position::Holding;

pub const BUY_QUORUM: usize = 3;
pub const RSI_LOWER: f64 = 30.0;
pub const RSI_UPPER: f64 = 70.0;
pub const RSI_OVERBOUGHT: f64 = 80.0;
pub const VOLUME_SURGE_RATIO: f64 = 1.5;
pub const MAX_DAILY_DECLINE: f64 = -3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuyConditions {
    pub golden_cross: bool,
    pub rsi_in_range: bool,
    pub volume_surge: bool,
    pub limited_decline: bool,
}

impl BuyConditions {
    /// `None` when any required indicator is missing.
    pub fn evaluate(analysis: &Analysis) -> Option<Self> {
        let (ma5, ma20, rsi) = match (analysis.ma5, analysis.ma20, analysis.rsi) {
            (Some(ma5), Some(ma20), Some(rsi)) => (ma5, ma20, rsi),
            _ => return None,
        };

        Some(BuyConditions {
            golden_cross: ma5 > ma20,
            rsi_in_range: rsi > RSI_LOWER && rsi < RSI_UPPER,
            volume_surge: analysis.volume_ratio > VOLUME_SURGE_RATIO,
            limited_decline: analysis.change_rate > MAX_DAILY_DECLINE,
        })
    }

    pub fn met(&self) -> usize {
        [
            self.golden_cross,
            self.rsi_in_range,
            self.volume_surge,
            self.limited_decline,
        ]
        .iter()
        .filter(|&&c| c)
        .count()
    }

    pub fn triggered(&self) -> bool {
        self.met() >= BUY_QUORUM
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SellConditions {
    pub stop_loss: bool,
    pub take_profit: bool,
    pub dead_cross: bool,
    pub overbought: bool,
}

impl SellConditions {
    pub fn evaluate(
        analysis: &Analysis,
        holding: &Holding,
        stop_loss_ratio: f64,
        take_profit_ratio: f64,
    ) -> Self {
        let profit_rate = holding.profit_rate(analysis.current_price);

        SellConditions {
            stop_loss: profit_rate <= -stop_loss_ratio,
            take_profit: profit_rate >= take_profit_ratio,
            dead_cross: matches!((analysis.ma5, analysis.ma20), (Some(ma5), Some(ma20)) if ma5 < ma20),
            overbought: matches!(analysis.rsi, Some(rsi) if rsi > RSI_OVERBOUGHT),
        }
    }

    pub fn triggered(&self) -> bool {
        self.stop_loss || self.take_profit || self.dead_cross || self.overbought
    }

    /// Names of the conditions that held, for logging.
    pub fn reasons(&self) -> Vec<&'static str> {
        [
            (self.stop_loss, "stop-loss"),
            (self.take_profit, "take-profit"),
            (self.dead_cross, "dead-cross"),
            (self.overbought, "overbought"),
        ]
        .into_iter()
        .filter_map(|(held, name)| held.then_some(name))
        .collect()
    }
}

pub fn should_buy(analysis: &Analysis) -> bool {
    BuyConditions::evaluate(analysis).is_some_and(|c| c.triggered())
}

pub fn should_sell(
    analysis: &Analysis,
    holding: Option<&Holding>,
    stop_loss_ratio: f64,
    take_profit_ratio: f64,
) -> bool {
    holding.is_some_and(|h| {
        SellConditions::evaluate(analysis, h, stop_loss_ratio, take_profit_ratio).triggered()
    })
}
