//! Cutting water tank level interlock.
//!
//! Watches the middle and high floats of the catch tank, keeps the dump
//! valve and low-pressure pump in line with the level, and suspends the
//! machine with an operator menu when the level cannot be held.
//!
//! M1405 disables the interlock, M1406 enables it again.

use log::info;

use super::{ConfigCheck, FaultMenus, LevelAlarm, OutputPin};
use crate::app::events::AppEvent;
use crate::app::ports::{CommandChannel, DigitalIo, EventSink, PanelPort};
use crate::config::WaterTankConfig;
use crate::diagnostics::StatusReport;
use crate::error::{ConfigError, Result};
use crate::safety::{LevelInterlock, LevelThresholds, LevelVerdict};
use crate::sensors::FloatSensors;

pub const MODULE: &str = "cutting_water_tank";

pub const DISABLE_MCODE: u16 = 1405;
pub const ENABLE_MCODE: u16 = 1406;

const HELP: [&str; 2] = ["M1405 disable", "M1406 enable"];

pub struct WaterTank {
    enabled: bool,
    sensors: FloatSensors,
    interlock: LevelInterlock,
    alarm: LevelAlarm,
    verdict: LevelVerdict,
    dump_valve: OutputPin,
    low_pressure_pump: OutputPin,
}

impl WaterTank {
    /// Build the tank interlock.  Every pin must be connected and every
    /// fault menu named; each missing key is logged.
    pub fn from_config(
        cfg: &WaterTankConfig,
        delay_seconds: u32,
        io: &impl DigitalIo,
    ) -> Result<Self> {
        if !cfg.enable {
            return Err(ConfigError::Disabled { module: MODULE }.into());
        }

        let mut check = ConfigCheck::new(MODULE);
        check.pin("middle_float_pin", &cfg.middle_float_pin, io);
        check.pin("high_float_pin", &cfg.high_float_pin, io);
        check.pin("dump_valve_pin", &cfg.dump_valve_pin, io);
        check.pin("low_pressure_pump_pin", &cfg.low_pressure_pump_pin, io);
        check.menu("low_water_detected_menu", &cfg.low_water_detected_menu);
        check.menu("high_water_detected_menu", &cfg.high_water_detected_menu);
        check.menu("filters_blocked_menu", &cfg.filters_blocked_menu);
        check.finish()?;

        info!(
            "{MODULE}: fill {}s, filter cleaning {}s, too low {}s",
            cfg.fill_cycle_seconds, cfg.filter_cleaning_seconds, cfg.water_level_too_low_seconds
        );
        Ok(Self {
            enabled: true,
            sensors: FloatSensors::new(&cfg.middle_float_pin, &cfg.high_float_pin, None),
            interlock: LevelInterlock::new(LevelThresholds {
                fill_cycle_seconds: cfg.fill_cycle_seconds,
                filter_cleaning_seconds: cfg.filter_cleaning_seconds,
                water_level_too_low_seconds: cfg.water_level_too_low_seconds,
            }),
            alarm: LevelAlarm::new(
                MODULE,
                delay_seconds,
                FaultMenus {
                    low_water: cfg.low_water_detected_menu.clone(),
                    level_too_high: cfg.high_water_detected_menu.clone(),
                    filters_blocked: cfg.filters_blocked_menu.clone(),
                },
            ),
            verdict: LevelVerdict::idle(),
            dump_valve: OutputPin::new(&cfg.dump_valve_pin),
            low_pressure_pump: OutputPin::new(&cfg.low_pressure_pump_pin),
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_paused(&self) -> bool {
        self.alarm.escalator.is_paused()
    }

    pub fn verdict(&self) -> LevelVerdict {
        self.verdict
    }

    pub fn interlock(&self) -> &LevelInterlock {
        &self.interlock
    }

    pub fn sensors(&self) -> &FloatSensors {
        &self.sensors
    }

    pub fn menus(&self) -> &FaultMenus {
        self.alarm.menus()
    }

    pub fn status(&self) -> StatusReport {
        let limits = self.interlock.limits();
        let mut report = StatusReport::new(MODULE, self.verdict.phase.name())
            .pin("dump_valve", &self.dump_valve.pin, self.dump_valve.written)
            .pin(
                "low_pressure_pump",
                &self.low_pressure_pump.pin,
                self.low_pressure_pump.written,
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
        report.active = self.enabled;
        report.suspended = self.is_paused();
        report.help = &HELP;
        report
    }

    // ── Commands ──────────────────────────────────────────────

    /// Handle M1405/M1406.  Returns whether the code was ours.
    pub fn on_mcode(&mut self, code: u16, sink: &mut impl EventSink) -> bool {
        let enabled = match code {
            DISABLE_MCODE => false,
            ENABLE_MCODE => true,
            _ => return false,
        };
        if enabled != self.enabled {
            info!("{MODULE}: {}", if enabled { "enabled" } else { "disabled" });
            self.enabled = enabled;
            if enabled {
                self.interlock.reset_timers();
            }
            sink.emit(&AppEvent::ModuleEnabled {
                module: MODULE,
                enabled,
            });
        }
        true
    }

    /// The operator resumed the machine.  Level history starts over.
    pub fn on_resume(&mut self) -> bool {
        let was_paused = self.alarm.escalator.resume();
        if was_paused {
            self.interlock.reset_timers();
        }
        was_paused
    }

    // ── Ticks ─────────────────────────────────────────────────

    pub fn poll(&self, io: &mut impl DigitalIo) {
        if self.enabled {
            self.sensors.poll(io);
        }
    }

    pub fn second_tick(
        &mut self,
        panel: &mut impl PanelPort,
        commands: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) {
        if !self.enabled {
            return;
        }
        self.alarm.escalator.tick();
        self.verdict = self.interlock.evaluate(self.sensors.snapshot());
        let fault = self.verdict.primary_fault();
        self.alarm.report(fault, panel, commands, sink);
    }

    /// Apply the outputs requested by the last evaluation.
    pub fn main_loop(&mut self, io: &mut impl DigitalIo) {
        if !self.enabled {
            return;
        }
        self.dump_valve.apply(self.verdict.dump_valve, io);
        self.low_pressure_pump.apply(self.verdict.low_pressure_pump, io);
    }

    /// `(pin, level)` of every output as last written.
    pub fn outputs(&self) -> [(&str, Option<bool>); 2] {
        [
            (self.dump_valve.pin.as_str(), self.dump_valve.written),
            (self.low_pressure_pump.pin.as_str(), self.low_pressure_pump.written),
        ]
    }
}
