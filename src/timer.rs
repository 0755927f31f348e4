//! Interlock timers.
//!
//! A [`TimerBank`] owns a handful of named second counters.  Callers never
//! start or stop a counter directly; they post a request that is applied at
//! the next [`TimerBank::tick`], so a start and a stop posted during the
//! same second resolve deterministically:
//!
//! ```text
//!   start pending ──▶ running, elapsed = 0, stop request dropped
//!   stop pending  ──▶ stopped, elapsed frozen
//!   running       ──▶ elapsed += 1
//! ```
//!
//! Counters may share an exclusive group (the fill/dump pair): starting one
//! stops every other counter of the group in the same tick.  Productive
//! counters stop advancing while the bank is frozen (machine suspended);
//! interlock counters never freeze.

use heapless::Vec;

/// Maximum number of counters in one bank.
pub const MAX_COUNTERS: usize = 4;

/// Handle to a counter inside its bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerKey(usize);

/// What a counter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Guards a physical condition; always advances.
    Interlock,
    /// Measures useful work; frozen while the machine is suspended.
    Productive,
}

#[derive(Debug, Clone)]
struct Counter {
    name: &'static str,
    kind: CounterKind,
    group: Option<u8>,
    elapsed: u32,
    running: bool,
    start_requested: bool,
    stop_requested: bool,
}

/// A bank of tick-driven second counters.
#[derive(Debug, Clone, Default)]
pub struct TimerBank {
    counters: Vec<Counter, MAX_COUNTERS>,
    frozen: bool,
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bank from counter declarations `(name, kind, exclusive group)`.
    /// Keys are returned in declaration order.
    pub fn with_counters<const N: usize>(
        specs: [(&'static str, CounterKind, Option<u8>); N],
    ) -> (Self, [TimerKey; N]) {
        const { assert!(N <= MAX_COUNTERS) };
        let mut bank = Self::new();
        for (name, kind, group) in specs {
            // Capacity checked above.
            let _ = bank.counters.push(Counter {
                name,
                kind,
                group,
                elapsed: 0,
                running: false,
                start_requested: false,
                stop_requested: false,
            });
        }
        (bank, core::array::from_fn(TimerKey))
    }

    /// Ask for `key` to restart from zero at the next tick.
    pub fn request_start(&mut self, key: TimerKey) {
        if let Some(c) = self.counters.get_mut(key.0) {
            c.start_requested = true;
        }
    }

    /// Ask for `key` to stop at the next tick.
    pub fn request_stop(&mut self, key: TimerKey) {
        if let Some(c) = self.counters.get_mut(key.0) {
            c.stop_requested = true;
        }
    }

    /// Start `key` unless it is already running.
    pub fn ensure_running(&mut self, key: TimerKey) {
        if !self.is_running(key) {
            self.request_start(key);
        }
    }

    /// Apply pending requests, then advance every running counter by one
    /// second.
    pub fn tick(&mut self) {
        // A start stops the other members of its group.
        for i in 0..self.counters.len() {
            let (start, group) = (self.counters[i].start_requested, self.counters[i].group);
            if let (true, Some(g)) = (start, group) {
                for (j, other) in self.counters.iter_mut().enumerate() {
                    if j != i && other.group == Some(g) && !other.start_requested {
                        other.stop_requested = true;
                    }
                }
            }
        }

        let frozen = self.frozen;
        for c in &mut self.counters {
            if c.start_requested {
                c.start_requested = false;
                c.stop_requested = false;
                c.running = true;
                c.elapsed = 0;
            } else if c.stop_requested {
                c.stop_requested = false;
                c.running = false;
            }

            if c.running && !(frozen && c.kind == CounterKind::Productive) {
                c.elapsed = c.elapsed.saturating_add(1);
            }
        }
    }

    /// Freeze or thaw the productive counters.  Takes effect at the next tick.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Stop every counter of `kind` and zero it, dropping pending requests.
    pub fn reset_kind(&mut self, kind: CounterKind) {
        for c in self.counters.iter_mut().filter(|c| c.kind == kind) {
            c.elapsed = 0;
            c.running = false;
            c.start_requested = false;
            c.stop_requested = false;
        }
    }

    /// Seconds counted since the last start.
    pub fn elapsed(&self, key: TimerKey) -> u32 {
        self.counters.get(key.0).map_or(0, |c| c.elapsed)
    }

    pub fn is_running(&self, key: TimerKey) -> bool {
        self.counters.get(key.0).is_some_and(|c| c.running)
    }

    /// `(name, elapsed, running)` for every counter, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32, bool)> + '_ {
        self.counters.iter().map(|c| (c.name, c.elapsed, c.running))
    }
}
