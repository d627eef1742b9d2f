//! Wall-clock adapter.

use chrono::{Local, NaiveDateTime};

use crate::ports::clock_port::ClockPort;

/// Local time of the host, which is expected to run on exchange time (KST).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl ClockPort for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
