//! kistrader: rule-based equity trading against the Korea Investment &
//! Securities Open API.
//!
//! Layout follows ports and adapters: [`domain`] holds the indicators,
//! signal rules, sizing and the strategy runner; [`ports`] defines the seams;
//! [`adapters`] talks to the broker, the config file and the clock.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
