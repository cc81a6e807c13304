use crate::domain::ports::Clock;
use std::time::Instant;

/// Wall-clock implementation backed by `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
