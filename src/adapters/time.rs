//! Host time adapter.
//!
//! Provides monotonic time and a drift-free periodic schedule for the
//! simulator's poll and second ticks.  Missed periods are not replayed:
//! after a stall the schedule realigns to the next boundary.

use std::time::{Duration, Instant};

/// Monotonic clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    /// Milliseconds since start.
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// A schedule firing every `period`, first at `start + period`.
    pub fn every(&self, period: Duration) -> TickSchedule {
        TickSchedule {
            period,
            next: self.start + period,
        }
    }
}

/// Fixed-period deadlines.
#[derive(Debug, Clone, Copy)]
pub struct TickSchedule {
    period: Duration,
    next: Instant,
}

impl TickSchedule {
    /// Time left until the next deadline, zero when it has passed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Advance past `now`.  Returns how many periods elapsed.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let mut fired = 0;
        while self.next <= now {
            self.next += self.period;
            fired += 1;
        }
        fired
    }

    /// Sleep until the next deadline and advance past it.
    pub fn wait(&mut self) -> u32 {
        let left = self.remaining(Instant::now());
        if !left.is_zero() {
            std::thread::sleep(left);
        }
        self.advance(Instant::now())
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
