//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  NONE ──[M1401]──▶ MENU ──[M1403, door closed]──▶ RUNNING ──▶ WATCHING ◀──▶ DUMPING
//!                     ▲                                          │    ▲
//!                     │                                  [level fault] │
//!                     │                                          ▼    │
//!                  ENDING ◀──[M1404]──             WAIT_FILL / FILTERS_BLOCKED /
//!                                                  IDLE_TOO_LONG / LEVEL_TOO_HIGH
//!                                                         │ [resume, cleared]
//!                                                         ▼
//!  PAUSED ──[resume]──▶ RESUMING ──────────────────────▶ WATCHING
//!
//!  Any raw value out of range ──▶ INVALID (terminal until a command)
//! ```

use super::context::{JetContext, ProcessOutputs, Suspension};
use super::{StateDescriptor, StateId};
use crate::error::LevelFault;
use crate::escalation::RESUME_COMMAND;
use crate::safety::LevelPhase;
use log::{error, info, warn};

/// Sent when the water jet suspends the machine.
pub const PAUSE_SEQUENCE: [&str; 6] = ["M600", "M9", "G4 S2.0", "M47", "M5", "M43"];

/// Sent when the machine resumes after a pause.
pub const RESUME_SEQUENCE: [&str; 5] = ["M42", "M46", "G4 S1.0", "M3", "M8"];

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

const fn row(
    id: StateId,
    name: &'static str,
    on_enter: Option<super::StateActionFn>,
    on_update: super::StateUpdateFn,
) -> StateDescriptor {
    StateDescriptor {
        id,
        name,
        on_enter,
        on_update,
    }
}

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        row(StateId::None, "None", Some(none_enter), stay),
        row(StateId::Menu, "Menu", Some(menu_enter), stay),
        row(StateId::Prep, "Prep", Some(prep_enter), prep_update),
        row(StateId::DryRun, "DryRun", Some(dry_run_enter), stay),
        row(StateId::Ready, "Ready", None, stay),
        row(StateId::Running, "Running", Some(running_enter), running_update),
        row(StateId::Watching, "Watching", None, watch_update),
        row(StateId::Paused, "Paused", Some(paused_enter), paused_update),
        row(StateId::Resuming, "Resuming", Some(resuming_enter), resuming_update),
        row(StateId::Ending, "Ending", Some(ending_enter), ending_update),
        row(StateId::IdleTooLong, "IdleTooLong", Some(idle_too_long_enter), fault_update),
        row(StateId::WaitFill, "WaitFill", Some(fault_enter), fault_update),
        row(StateId::Dumping, "Dumping", None, watch_update),
        row(StateId::FiltersBlocked, "FiltersBlocked", Some(fault_enter), fault_update),
        row(StateId::LevelTooHigh, "LevelTooHigh", Some(level_too_high_enter), fault_update),
        row(StateId::GantryStalled, "GantryStalled", Some(gantry_stalled_enter), paused_update),
        row(StateId::EndstopTriggered, "EndstopTriggered", Some(endstop_enter), ending_update),
        row(StateId::Invalid, "Invalid", Some(invalid_enter), stay),
    ]
}

fn stay(_ctx: &mut JetContext) -> Option<StateId> {
    None
}

fn fault_state(fault: LevelFault) -> StateId {
    match fault {
        LevelFault::LowWater => StateId::WaitFill,
        LevelFault::FiltersBlocked => StateId::FiltersBlocked,
        LevelFault::TankIdleTooLong => StateId::IdleTooLong,
        LevelFault::LevelTooHigh => StateId::LevelTooHigh,
    }
}

/// Record the most severe fault for escalation and pick its state.
fn take_fault(ctx: &mut JetContext) -> Option<StateId> {
    let fault = ctx.verdict.primary_fault()?;
    ctx.raised_fault = Some(fault);
    Some(fault_state(fault))
}

fn suspend(ctx: &mut JetContext) {
    ctx.outputs.high_pressure_pump = false;
    ctx.send_all(&PAUSE_SEQUENCE);
    ctx.suspend_requested = true;
    ctx.suspension = Some(Suspension::PauseSequence);
    ctx.paused = true;
    ctx.timers.set_frozen(true);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Idle states
// ═══════════════════════════════════════════════════════════════════════════

fn none_enter(ctx: &mut JetContext) {
    ctx.outputs = ProcessOutputs::all_off();
    ctx.suspension = None;
}

fn menu_enter(ctx: &mut JetContext) {
    ctx.outputs.high_pressure_pump = false;
    info!("MENU: waiting for a job");
}

fn prep_enter(ctx: &mut JetContext) {
    ctx.outputs.low_pressure_pump = true;
    info!("PREP: priming the tank");
}

fn prep_update(ctx: &mut JetContext) -> Option<StateId> {
    // Primed once water reaches the middle float.
    (ctx.verdict.phase == LevelPhase::Dumping).then_some(StateId::Ready)
}

fn dry_run_enter(ctx: &mut JetContext) {
    ctx.outputs.high_pressure_pump = false;
    info!("DRY_RUN: cutting head off");
}

// ═══════════════════════════════════════════════════════════════════════════
//  Job
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut JetContext) {
    ctx.start_productive_timers();
    ctx.timers.set_frozen(false);
    ctx.paused = false;
    ctx.outputs.low_pressure_pump = true;
    ctx.outputs.high_pressure_pump = true;
    info!("RUNNING: pumps on, abrasive timers started");
}

fn running_update(_ctx: &mut JetContext) -> Option<StateId> {
    Some(StateId::Watching)
}

/// Watching and dumping: follow the tank phase, leave on any fault.
fn watch_update(ctx: &mut JetContext) -> Option<StateId> {
    if let Some(next) = take_fault(ctx) {
        return Some(next);
    }
    if ctx.paused {
        return None;
    }
    match ctx.verdict.phase {
        LevelPhase::Dumping => Some(StateId::Dumping),
        _ => Some(StateId::Watching),
    }
}

fn ending_enter(ctx: &mut JetContext) {
    ctx.stop_productive_timers();
    ctx.outputs.high_pressure_pump = false;
    ctx.outputs.low_pressure_pump = false;
    info!("ENDING: job finished");
}

fn ending_update(_ctx: &mut JetContext) -> Option<StateId> {
    Some(StateId::Menu)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Pause / resume
// ═══════════════════════════════════════════════════════════════════════════

fn paused_enter(ctx: &mut JetContext) {
    suspend(ctx);
    info!("PAUSED: machine suspended");
}

fn paused_update(ctx: &mut JetContext) -> Option<StateId> {
    if ctx.verdict.has_fault(LevelFault::LevelTooHigh) {
        ctx.raised_fault = Some(LevelFault::LevelTooHigh);
        return Some(StateId::LevelTooHigh);
    }
    (!ctx.paused).then_some(StateId::Resuming)
}

fn resuming_enter(ctx: &mut JetContext) {
    // Undo whatever suspended the machine.
    match ctx.suspension.take() {
        Some(Suspension::Escalation) => ctx.send_all(&[RESUME_COMMAND]),
        Some(Suspension::PauseSequence) | None => ctx.send_all(&RESUME_SEQUENCE),
    }
    ctx.timers.set_frozen(false);
    ctx.outputs.low_pressure_pump = true;
    ctx.outputs.high_pressure_pump = true;
    info!("RESUMING: pumps back on");
}

fn resuming_update(_ctx: &mut JetContext) -> Option<StateId> {
    Some(StateId::Watching)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Level faults
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter(ctx: &mut JetContext) {
    ctx.outputs.high_pressure_pump = false;
    ctx.timers.set_frozen(true);
    warn!("level fault: cutting head off, faults=0b{:04b}", ctx.verdict.faults);
}

fn idle_too_long_enter(ctx: &mut JetContext) {
    fault_enter(ctx);
    ctx.outputs.dump_valve = false;
    ctx.outputs.low_pressure_pump = false;
}

fn level_too_high_enter(ctx: &mut JetContext) {
    fault_enter(ctx);
    ctx.outputs.dump_valve = true;
    ctx.outputs.low_pressure_pump = true;
}

/// Stay while a fault holds or the machine is still suspended.
fn fault_update(ctx: &mut JetContext) -> Option<StateId> {
    if let Some(next) = take_fault(ctx) {
        return Some(next);
    }
    (!ctx.paused).then_some(StateId::Resuming)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Motion faults
// ═══════════════════════════════════════════════════════════════════════════

fn gantry_stalled_enter(ctx: &mut JetContext) {
    suspend(ctx);
    warn!("GANTRY_STALLED: machine suspended");
}

fn endstop_enter(ctx: &mut JetContext) {
    ctx.outputs.high_pressure_pump = false;
    warn!("ENDSTOP_TRIGGERED: cutting head off");
}

fn invalid_enter(ctx: &mut JetContext) {
    ctx.outputs = ProcessOutputs::all_off();
    ctx.stop_productive_timers();
    error!("INVALID: bad state value received, outputs off");
}
