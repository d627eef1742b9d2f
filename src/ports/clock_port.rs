//! Wall-clock access port trait.

use chrono::NaiveDateTime;

pub trait ClockPort {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}
