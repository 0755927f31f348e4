//! Water-level interlock.
//!
//! The interlock runs **every second tick** for the tank and water-jet
//! modules.  It owns the fill/dump timer pair, evaluates the two float
//! sensors in a fixed priority order, and accumulates a
//! [`LevelFault`] bitmask the owning module escalates.
//!
//! ## Evaluation order
//!
//! 1. Fill timer beyond `water_level_too_low_seconds` → idle-too-long:
//!    dump valve and low-pressure pump off.
//! 2. Middle float dry → filling: dump valve closed, fill timer runs
//!    (dump stops); beyond `fill_cycle_seconds` → low water.
//! 3. Middle float wet → dumping: dump valve open, dump timer runs
//!    (fill stops); beyond `filter_cleaning_seconds` → filters blocked.
//! 4. High float wet (independent of 1–3) → level too high: dump valve on.
//!
//! Faults are cleared as soon as their condition stops holding; the
//! interlock never latches.  Escalation and rate limiting live in
//! [`crate::escalation`].

use log::{error, info};

use crate::error::LevelFault;
use crate::timer::{CounterKind, TimerBank, TimerKey};

/// Float readings sampled by the poll tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatSnapshot {
    /// Water above the middle mark.
    pub middle: bool,
    /// Water at the high mark.
    pub high: bool,
}

/// Timing limits for one tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelThresholds {
    pub fill_cycle_seconds: u32,
    pub filter_cleaning_seconds: u32,
    pub water_level_too_low_seconds: u32,
}

/// What the tank is doing this second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPhase {
    /// Not evaluated yet.
    Idle,
    Filling,
    Dumping,
    /// Filling has gone on so long the tank is considered abandoned.
    TooLow,
}

impl LevelPhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Filling => "FILLING",
            Self::Dumping => "DUMPING",
            Self::TooLow => "TOO_LOW",
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelVerdict {
    pub phase: LevelPhase,
    /// Active [`LevelFault`] bits.
    pub faults: u8,
    /// Requested dump valve level; `None` leaves it as it is.
    pub dump_valve: Option<bool>,
    /// Requested low-pressure pump level; `None` leaves it as it is.
    pub low_pressure_pump: Option<bool>,
}

impl LevelVerdict {
    pub const fn idle() -> Self {
        Self {
            phase: LevelPhase::Idle,
            faults: 0,
            dump_valve: None,
            low_pressure_pump: None,
        }
    }

    /// The fault whose menu should be on screen.
    pub fn primary_fault(&self) -> Option<LevelFault> {
        LevelFault::most_severe(self.faults)
    }

    pub fn has_fault(&self, fault: LevelFault) -> bool {
        self.faults & fault.mask() != 0
    }
}

/// Level interlock for one tank.
pub struct LevelInterlock {
    limits: LevelThresholds,
    timers: TimerBank,
    fill: TimerKey,
    dump: TimerKey,
    /// Latched fault bitmask.
    faults: u8,
}

const FILL_DUMP_GROUP: u8 = 0;

impl LevelInterlock {
    pub fn new(limits: LevelThresholds) -> Self {
        let (timers, [fill, dump]) = TimerBank::with_counters([
            ("fill_timer", CounterKind::Interlock, Some(FILL_DUMP_GROUP)),
            ("dump_timer", CounterKind::Interlock, Some(FILL_DUMP_GROUP)),
        ]);
        Self {
            limits,
            timers,
            fill,
            dump,
            faults: 0,
        }
    }

    /// Evaluate one second against the latest float readings.
    pub fn evaluate(&mut self, snap: FloatSnapshot) -> LevelVerdict {
        let mut verdict = LevelVerdict::idle();

        // ── Timer requests ────────────────────────────────────────
        let too_low = self.timers.elapsed(self.fill) > self.limits.water_level_too_low_seconds;
        if too_low {
            verdict.phase = LevelPhase::TooLow;
            verdict.dump_valve = Some(false);
            verdict.low_pressure_pump = Some(false);
        } else if !snap.middle {
            self.timers.ensure_running(self.fill);
            verdict.phase = LevelPhase::Filling;
            verdict.dump_valve = Some(false);
        } else {
            self.timers.ensure_running(self.dump);
            verdict.phase = LevelPhase::Dumping;
            verdict.dump_valve = Some(true);
        }

        self.timers.tick();

        // ── Threshold comparison ──────────────────────────────────
        self.eval_fault(LevelFault::TankIdleTooLong, too_low);
        self.eval_fault(
            LevelFault::LowWater,
            verdict.phase == LevelPhase::Filling
                && self.timers.elapsed(self.fill) > self.limits.fill_cycle_seconds,
        );
        self.eval_fault(
            LevelFault::FiltersBlocked,
            verdict.phase == LevelPhase::Dumping
                && self.timers.elapsed(self.dump) > self.limits.filter_cleaning_seconds,
        );

        // ── High float ────────────────────────────────────────────
        self.eval_fault(LevelFault::LevelTooHigh, snap.high);
        if snap.high {
            verdict.dump_valve = Some(true);
        }

        verdict.faults = self.faults;
        verdict
    }

    /// Forget the fill/dump history so the next evaluation starts fresh.
    pub fn reset_timers(&mut self) {
        self.timers.reset_kind(CounterKind::Interlock);
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn limits(&self) -> LevelThresholds {
        self.limits
    }

    pub fn fill_elapsed(&self) -> u32 {
        self.timers.elapsed(self.fill)
    }

    pub fn dump_elapsed(&self) -> u32 {
        self.timers.elapsed(self.dump)
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: LevelFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("LEVEL FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("LEVEL FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
