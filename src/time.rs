//! Time sources and clock skew arithmetic.

use std::time::{Duration, SystemTime};

/// Supplies "now" to the validator. Tests pin it with [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(SystemTime);

impl FixedClock {
    pub fn new(now: SystemTime) -> Self {
        FixedClock(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// Distance between two instants regardless of order.
pub fn abs_diff(a: SystemTime, b: SystemTime) -> Duration {
    match a.duration_since(b) {
        Ok(d) => d,
        Err(err) => err.duration(),
    }
}

/// True when `a` and `b` are no more than `skew` apart. The bound is inclusive.
pub fn within_skew(a: SystemTime, b: SystemTime, skew: Duration) -> bool {
    abs_diff(a, b) <= skew
}

/// `now + skew`, saturating rather than overflowing the platform's time range.
pub fn later_by(now: SystemTime, skew: Duration) -> SystemTime {
    now.checked_add(skew).unwrap_or(now)
}

/// `now - skew`, saturating at `now` when it cannot be represented.
pub fn earlier_by(now: SystemTime, skew: Duration) -> SystemTime {
    now.checked_sub(skew).unwrap_or(now)
}
