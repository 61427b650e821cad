//! Clock abstraction for expiry checks and timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in Unix milliseconds.
///
/// Abstracted so expiry can be tested deterministically.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Milliseconds in one minute.
pub const MINUTE_MILLIS: i64 = 60_000;
