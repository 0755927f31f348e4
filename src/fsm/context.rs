//! Shared mutable context threaded through every FSM handler.
//!
//! `JetContext` is the single struct that state handlers read from and
//! write to: the latest level verdict, the requested outputs, the
//! productive timers, and the machine commands queued for the main loop.
//! Think of it as the "blackboard" in a blackboard architecture.

use heapless::Vec;
use log::warn;

use crate::error::LevelFault;
use crate::safety::LevelVerdict;
use crate::timer::{CounterKind, TimerBank, TimerKey};

/// Commands queued between two main-loop flushes.
pub const OUTBOX_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Outputs (written by state handlers; applied by the main loop)
// ---------------------------------------------------------------------------

/// Requested levels of the water-jet outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOutputs {
    pub dump_valve: bool,
    pub low_pressure_pump: bool,
    pub high_pressure_pump: bool,
}

impl ProcessOutputs {
    /// Everything off.
    pub fn all_off() -> Self {
        Self::default()
    }
}

/// What suspended the machine; picks the commands that resume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    /// A state handler sent the full pause sequence.
    PauseSequence,
    /// The fault escalator sent the suspend command alone.
    Escalation,
}

// ---------------------------------------------------------------------------
// JetContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct JetContext {
    // -- Inputs --
    /// Latest level interlock verdict.  Updated before each FSM tick.
    pub verdict: LevelVerdict,
    pub door_closed: bool,
    /// Machine suspended; cleared by the operator's resume.
    pub paused: bool,

    // -- Outputs --
    pub outputs: ProcessOutputs,
    /// Machine commands for the main loop to send, in order.
    pub outbox: Vec<&'static str, OUTBOX_CAPACITY>,
    /// Fault to escalate after this tick.
    pub raised_fault: Option<LevelFault>,
    /// A handler suspended the machine itself.
    pub suspend_requested: bool,
    pub suspension: Option<Suspension>,

    // -- Productive timers --
    pub timers: TimerBank,
    pub abrasive_hopper: TimerKey,
    pub spent_abrasive: TimerKey,
}

impl JetContext {
    pub fn new() -> Self {
        let (timers, [abrasive_hopper, spent_abrasive]) = TimerBank::with_counters([
            ("abrasive_hopper", CounterKind::Productive, None),
            ("spent_abrasive", CounterKind::Productive, None),
        ]);
        Self {
            verdict: LevelVerdict::idle(),
            door_closed: false,
            paused: false,
            outputs: ProcessOutputs::all_off(),
            outbox: Vec::new(),
            raised_fault: None,
            suspend_requested: false,
            suspension: None,
            timers,
            abrasive_hopper,
            spent_abrasive,
        }
    }

    /// Queue machine commands for the main loop.
    pub fn send_all(&mut self, commands: &[&'static str]) {
        for &command in commands {
            if self.outbox.push(command).is_err() {
                warn!("FSM outbox full, dropping '{command}'");
            }
        }
    }

    /// Start the abrasive timers unless they already run.
    pub fn start_productive_timers(&mut self) {
        self.timers.ensure_running(self.abrasive_hopper);
        self.timers.ensure_running(self.spent_abrasive);
    }

    pub fn stop_productive_timers(&mut self) {
        self.timers.request_stop(self.abrasive_hopper);
        self.timers.request_stop(self.spent_abrasive);
    }
}

impl Default for JetContext {
    fn default() -> Self {
        Self::new()
    }
}
