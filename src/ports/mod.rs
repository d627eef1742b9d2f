//! Port traits: the seams between the trading engine and the outside world.

pub mod broker_port;
pub mod clock_port;
pub mod config_port;
