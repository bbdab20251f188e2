//! Timestamps for history entries.

use std::sync::atomic::{AtomicI64, Ordering};

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Source of the RFC 3339 UTC timestamps written into record history.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> String;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        rfc3339(OffsetDateTime::now_utc())
    }
}

/// A clock that starts at a fixed instant and moves forward by `step`
/// every time it is read. A zero step yields the same timestamp forever.
#[derive(Debug)]
pub struct SteppingClock {
    start: OffsetDateTime,
    step_seconds: i64,
    ticks: AtomicI64,
}

impl SteppingClock {
    pub fn new(start: OffsetDateTime, step: Duration) -> Self {
        Self {
            start,
            step_seconds: step.whole_seconds(),
            ticks: AtomicI64::new(0),
        }
    }

    pub fn fixed(at: OffsetDateTime) -> Self {
        Self::new(at, Duration::ZERO)
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> String {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        let offset = Duration::seconds(tick.saturating_mul(self.step_seconds));
        rfc3339(self.start.saturating_add(offset))
    }
}

fn rfc3339(at: OffsetDateTime) -> String {
    // Only years outside 0..=9999 fail to format.
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
