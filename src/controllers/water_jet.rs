//! Water-jet cutter process controller.
//!
//! Owns the process FSM ([`crate::fsm`]) and the level interlock of the
//! cutter's own catch tank.  Each second the interlock is evaluated (in
//! the states where the tank is in use), its verdict is fed to the FSM,
//! and any fault the FSM raises is escalated to the operator.
//!
//! | M-code | Action                                             |
//! |--------|----------------------------------------------------|
//! | M1400  | status report                                      |
//! | M1401  | enable module, start abrasive timers               |
//! | M1402  | disable module                                     |
//! | M1403  | start job (refused while the door is open)         |
//! | M1404  | end job                                            |

use log::{error, info, warn};

use super::{ConfigCheck, FaultMenus, LevelAlarm, OutputPin};
use crate::app::events::AppEvent;
use crate::app::ports::{CommandChannel, DigitalIo, EventSink, PanelPort};
use crate::config::WaterJetConfig;
use crate::diagnostics::StatusReport;
use crate::error::{ConfigError, Error, LogicError, Result};
use crate::fsm::context::{JetContext, Suspension};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Transition};
use crate::safety::{LevelInterlock, LevelThresholds, LevelVerdict};
use crate::sensors::FloatSensors;

pub const MODULE: &str = "waterjetcutter";

pub const STATUS_MCODE: u16 = 1400;
pub const ENABLE_MCODE: u16 = 1401;
pub const DISABLE_MCODE: u16 = 1402;
pub const START_JOB_MCODE: u16 = 1403;
pub const END_JOB_MCODE: u16 = 1404;

const HELP: [&str; 5] = [
    "M1400 status report",
    "M1401 enable, start abrasive timers",
    "M1402 disable",
    "M1403 start job (door closed)",
    "M1404 end job",
];

pub struct WaterJet {
    active: bool,
    fsm: Fsm,
    ctx: JetContext,
    sensors: FloatSensors,
    interlock: LevelInterlock,
    alarm: LevelAlarm,
    dump_valve: OutputPin,
    low_pressure_pump: OutputPin,
    high_pressure_pump: OutputPin,
}

impl WaterJet {
    /// Build the cutter controller.  Every pin must be connected and every
    /// fault menu named; each missing key is logged.
    pub fn from_config(cfg: &WaterJetConfig, delay_seconds: u32, io: &impl DigitalIo) -> Result<Self> {
        if !cfg.enable {
            return Err(ConfigError::Disabled { module: MODULE }.into());
        }

        let mut check = ConfigCheck::new(MODULE);
        check.pin("door_switch_pin", &cfg.door_switch_pin, io);
        check.pin("middle_float_pin", &cfg.middle_float_pin, io);
        check.pin("high_float_pin", &cfg.high_float_pin, io);
        check.pin("dump_valve_pin", &cfg.dump_valve_pin, io);
        check.pin("low_pressure_pump_pin", &cfg.low_pressure_pump_pin, io);
        check.pin("high_pressure_pump_pin", &cfg.high_pressure_pump_pin, io);
        check.menu("error_wl_low_menu", &cfg.error_wl_low_menu);
        check.menu("error_wl_high_menu", &cfg.error_wl_high_menu);
        check.menu("error_clean_filters_menu", &cfg.error_clean_filters_menu);
        check.finish()?;

        let mut ctx = JetContext::new();
        let mut fsm = Fsm::new(build_state_table(), StateId::None);
        fsm.start(&mut ctx);

        info!(
            "{MODULE}: fill {}s, filter cleaning {}s, too low {}s",
            cfg.fill_cycle_seconds, cfg.filter_cleaning_seconds, cfg.water_level_too_low_seconds
        );
        Ok(Self {
            active: false,
            fsm,
            ctx,
            sensors: FloatSensors::new(
                &cfg.middle_float_pin,
                &cfg.high_float_pin,
                Some(&cfg.door_switch_pin),
            ),
            interlock: LevelInterlock::new(LevelThresholds {
                fill_cycle_seconds: cfg.fill_cycle_seconds,
                filter_cleaning_seconds: cfg.filter_cleaning_seconds,
                water_level_too_low_seconds: cfg.water_level_too_low_seconds,
            }),
            alarm: LevelAlarm::new(
                MODULE,
                delay_seconds,
                FaultMenus {
                    low_water: cfg.error_wl_low_menu.clone(),
                    level_too_high: cfg.error_wl_high_menu.clone(),
                    filters_blocked: cfg.error_clean_filters_menu.clone(),
                },
            ),
            dump_valve: OutputPin::new(&cfg.dump_valve_pin),
            low_pressure_pump: OutputPin::new(&cfg.low_pressure_pump_pin),
            high_pressure_pump: OutputPin::new(&cfg.high_pressure_pump_pin),
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn previous_state(&self) -> StateId {
        self.fsm.previous_state()
    }

    pub fn is_paused(&self) -> bool {
        self.alarm.escalator.is_paused()
    }

    pub fn verdict(&self) -> LevelVerdict {
        self.ctx.verdict
    }

    pub fn context(&self) -> &JetContext {
        &self.ctx
    }

    pub fn interlock(&self) -> &LevelInterlock {
        &self.interlock
    }

    pub fn menus(&self) -> &FaultMenus {
        self.alarm.menus()
    }

    pub fn status(&self) -> StatusReport {
        let limits = self.interlock.limits();
        let mut report = StatusReport::new(MODULE, self.state().name())
            .pin(
                "door_switch",
                self.sensors.door_pin().unwrap_or_default(),
                Some(self.sensors.door_closed()),
            )
            .pin("dump_valve", &self.dump_valve.pin, self.dump_valve.written)
            .pin(
                "low_pressure_pump",
                &self.low_pressure_pump.pin,
                self.low_pressure_pump.written,
            )
            .pin(
                "high_pressure_pump",
                &self.high_pressure_pump.pin,
                self.high_pressure_pump.written,
            )
            .timer(
                "fill_timer",
                self.interlock.fill_elapsed(),
                Some(limits.fill_cycle_seconds),
            )
            .timer(
                "dump_timer",
                self.interlock.dump_elapsed(),
                Some(limits.filter_cleaning_seconds),
            );
        for (name, elapsed, _) in self.ctx.timers.iter() {
            report = report.timer(name, elapsed, None);
        }
        report.previous_state = Some(self.previous_state().name());
        report.active = self.active;
        report.suspended = self.is_paused();
        report.help = &HELP;
        report
    }

    // ── Commands ──────────────────────────────────────────────

    /// Handle M1400-M1404.  Returns the console reply when the code is ours.
    pub fn on_mcode(&mut self, code: u16, sink: &mut impl EventSink) -> Option<Vec<String>> {
        let reply = match code {
            STATUS_MCODE => return Some(self.status().lines()),
            ENABLE_MCODE => {
                if !self.active {
                    self.active = true;
                    sink.emit(&AppEvent::ModuleEnabled {
                        module: MODULE,
                        enabled: true,
                    });
                }
                if self.state() == StateId::None {
                    self.goto(StateId::Menu, sink);
                }
                self.ctx.start_productive_timers();
                format!("{MODULE} active")
            }
            DISABLE_MCODE => {
                if self.active {
                    self.active = false;
                    sink.emit(&AppEvent::ModuleEnabled {
                        module: MODULE,
                        enabled: false,
                    });
                }
                self.ctx.stop_productive_timers();
                self.goto(StateId::None, sink);
                format!("{MODULE} inactive")
            }
            START_JOB_MCODE => {
                if !self.active {
                    warn!("{MODULE}: M{code} while inactive");
                    format!("{MODULE} not active, send M{ENABLE_MCODE} first")
                } else if !self.sensors.door_closed() {
                    warn!("{MODULE}: door open, job refused");
                    format!("{MODULE} door open, job refused")
                } else {
                    self.goto(StateId::Running, sink);
                    format!("{MODULE} job started")
                }
            }
            END_JOB_MCODE => {
                self.goto(StateId::Ending, sink);
                format!("{MODULE} job ended")
            }
            _ => return None,
        };
        Some(vec![reply])
    }

    /// A raw process-state value from the menu.  Out-of-range values are
    /// logged and land in [`StateId::Invalid`].
    pub fn set_state_raw(&mut self, raw: u8, sink: &mut impl EventSink) {
        let next = StateId::from_raw(raw);
        if next == StateId::Invalid && raw != StateId::Invalid as u8 {
            error!("{MODULE}: {}", Error::Logic(LogicError::BadState(raw)));
        }
        self.goto(next, sink);
    }

    /// The operator resumed the machine.  Level history starts over and the
    /// FSM leaves its pause or fault state on the next tick.
    pub fn on_resume(&mut self) -> bool {
        let was_paused = self.alarm.escalator.resume() | self.ctx.paused;
        if was_paused {
            self.ctx.paused = false;
            self.interlock.reset_timers();
        }
        was_paused
    }

    // ── Ticks ─────────────────────────────────────────────────

    pub fn poll(&self, io: &mut impl DigitalIo) {
        if self.active {
            self.sensors.poll(io);
        }
    }

    pub fn second_tick(
        &mut self,
        panel: &mut impl PanelPort,
        commands: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) {
        if !self.active {
            return;
        }
        self.alarm.escalator.tick();

        self.ctx.door_closed = self.sensors.door_closed();
        self.ctx.verdict = if tank_in_use(self.state()) {
            self.interlock.evaluate(self.sensors.snapshot())
        } else {
            LevelVerdict::idle()
        };
        if let Some(open) = self.ctx.verdict.dump_valve {
            self.ctx.outputs.dump_valve = open;
        }
        if let Some(on) = self.ctx.verdict.low_pressure_pump {
            self.ctx.outputs.low_pressure_pump = on;
        }
        self.ctx.paused = self.alarm.escalator.is_paused();
        self.ctx.timers.tick();

        if let Some(t) = self.fsm.tick(&mut self.ctx) {
            emit_transition(t, sink);
        }

        self.absorb_suspend(sink);

        let fault = self.ctx.raised_fault.take();
        if fault.is_some() || self.state().escalates_faults() {
            let out = self.alarm.report(fault, panel, commands, sink);
            if out.suspended {
                self.ctx.suspension.get_or_insert(Suspension::Escalation);
            }
        }

        self.ctx.paused = self.alarm.escalator.is_paused();
        if self.ctx.paused {
            self.ctx.timers.set_frozen(true);
        }
    }

    /// Send queued commands and drive the outputs.
    pub fn main_loop(&mut self, io: &mut impl DigitalIo, commands: &mut impl CommandChannel) {
        for command in &self.ctx.outbox {
            commands.send(command);
        }
        self.ctx.outbox.clear();

        let out = self.ctx.outputs;
        self.dump_valve.apply(Some(out.dump_valve), io);
        self.low_pressure_pump.apply(Some(out.low_pressure_pump), io);
        self.high_pressure_pump.apply(Some(out.high_pressure_pump), io);
    }

    // ── Internal ──────────────────────────────────────────────

    fn goto(&mut self, next: StateId, sink: &mut impl EventSink) {
        if next == StateId::Running {
            // A new job starts unpaused with a fresh level history.
            self.alarm.escalator.resume();
            self.interlock.reset_timers();
            self.ctx.suspension = None;
        }
        if let Some(t) = self.fsm.force_transition(next, &mut self.ctx) {
            emit_transition(t, sink);
        }
        self.absorb_suspend(sink);
    }

    /// A state handler suspended the machine itself.
    fn absorb_suspend(&mut self, sink: &mut impl EventSink) {
        if core::mem::take(&mut self.ctx.suspend_requested) {
            self.alarm.escalator.mark_paused();
            sink.emit(&AppEvent::Suspended { module: MODULE });
        }
    }
}

/// States in which the catch tank holds water and is evaluated.
fn tank_in_use(state: StateId) -> bool {
    matches!(
        state,
        StateId::Prep
            | StateId::Running
            | StateId::Watching
            | StateId::Paused
            | StateId::Resuming
            | StateId::Dumping
            | StateId::IdleTooLong
            | StateId::WaitFill
            | StateId::FiltersBlocked
            | StateId::LevelTooHigh
            | StateId::GantryStalled
    )
}

fn emit_transition(t: Transition, sink: &mut impl EventSink) {
    sink.emit(&AppEvent::StateChanged {
        from: t.from,
        to: t.to,
    });
}
