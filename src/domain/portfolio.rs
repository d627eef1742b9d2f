//! Portfolio view reconstructed from a broker balance.
//!
//! The broker is the source of truth: a `Portfolio` is rebuilt from every
//! balance response and replaced wholesale, never patched.

use std::collections::BTreeMap;

use super::position::{Holding, HoldingRecord};

/// Balance payload as returned by the gateway, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    pub cash: i64,
    pub holdings: Vec<HoldingRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: i64,
    pub holdings: BTreeMap<String, Holding>,
}

impl Portfolio {
    /// Keeps only positive-quantity holdings; a negative cash figure is
    /// clamped to zero.
    pub fn from_balance(snapshot: BalanceSnapshot) -> Self {
        let holdings = snapshot
            .holdings
            .into_iter()
            .filter_map(Holding::from_record)
            .map(|h| (h.symbol.clone(), h))
            .collect();

        Portfolio {
            cash: snapshot.cash.max(0),
            holdings,
        }
    }

    pub fn get_holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn has_holding(&self, symbol: &str) -> bool {
        self.holdings.contains_key(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn total_value(&self) -> i64 {
        self.cash + self.holdings.values().map(|h| h.current_value).sum::<i64>()
    }

    pub fn total_unrealized_pnl(&self) -> i64 {
        self.holdings.values().map(|h| h.unrealized_pnl).sum()
    }
}
