//! Core domain types and trading logic.

pub mod analysis;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod market_hours;
pub mod ohlcv;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod runner;
pub mod scheduler;
pub mod signal;
pub mod sizing;
pub mod strategy;
pub mod watchlist;
