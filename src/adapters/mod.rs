//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod http;
pub mod kis;
pub mod system_clock;
