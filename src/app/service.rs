//! Application service: the hexagonal core.
//!
//! [`Controller`] owns every interlock module built from configuration and
//! the menu navigator.  It exposes a clean, hardware-agnostic API; all I/O
//! flows through port traits injected at call sites.
//!
//! ```text
//!   DigitalIo ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                 │         Controller          │
//! SwitchRegistry ◀│ timers · tank · jet · menu  │──▶ CommandChannel
//!                 └────────────────────────────┘
//!                        ▲              ▲
//!                     MenuFs      MachineState
//! ```
//!
//! The host calls [`Controller::poll_tick`] at ~10 Hz,
//! [`Controller::second_tick`] once a second and [`Controller::main_loop`]
//! after every second tick.

use log::{debug, error, info, warn};

use crate::app::commands::AppCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{
    CommandChannel, DigitalIo, EventSink, MachineState, MenuFs, SwitchRegistry,
};
use crate::config::ControllerConfig;
use crate::controllers::{CounterTimer, WaterJet, WaterTank};
use crate::diagnostics::StatusReport;
use crate::error::{ConfigError, Error, Result};
use crate::menu::{ClickOutcome, DisplayLine, Navigator};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller {
    counter_timers: Vec<CounterTimer>,
    water_tank: Option<WaterTank>,
    water_jet: Option<WaterJet>,
    navigator: Navigator,
    seconds: u64,
}

impl Controller {
    /// Build every enabled module.  A module whose section fails validation
    /// is logged and left out; the others still run.
    pub fn from_config(cfg: &ControllerConfig, io: &impl DigitalIo) -> Self {
        let counter_timers = cfg
            .counter_timers
            .iter()
            .filter_map(|c| built("timercounter", CounterTimer::from_config(c)))
            .collect::<Vec<_>>();
        let water_tank = built(
            "cutting_water_tank",
            WaterTank::from_config(&cfg.cutting_water_tank, cfg.fault_delay_seconds, io),
        );
        let water_jet = built(
            "waterjetcutter",
            WaterJet::from_config(&cfg.waterjetcutter, cfg.fault_delay_seconds, io),
        );

        info!(
            "Controller up: {} counter timer(s), water tank {}, water jet {}",
            counter_timers.len(),
            if water_tank.is_some() { "on" } else { "off" },
            if water_jet.is_some() { "on" } else { "off" },
        );
        Self {
            counter_timers,
            water_tank,
            water_jet,
            navigator: Navigator::new(&cfg.panel.menu_root, &cfg.panel.language),
            seconds: 0,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Sample every module's inputs.
    pub fn poll_tick(&self, io: &mut impl DigitalIo) {
        if let Some(tank) = &self.water_tank {
            tank.poll(io);
        }
        if let Some(jet) = &self.water_jet {
            jet.poll(io);
        }
    }

    /// One second of module logic: timers, thresholds, fault escalation.
    pub fn second_tick(
        &mut self,
        switches: &mut impl SwitchRegistry,
        commands: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) {
        self.seconds += 1;
        for timer in &mut self.counter_timers {
            timer.second_tick(switches, &mut self.navigator, sink);
        }
        if let Some(tank) = &mut self.water_tank {
            tank.second_tick(&mut self.navigator, commands, sink);
        }
        if let Some(jet) = &mut self.water_jet {
            jet.second_tick(&mut self.navigator, commands, sink);
        }
    }

    /// Apply requested outputs and flush queued machine commands.
    pub fn main_loop(&mut self, io: &mut impl DigitalIo, commands: &mut impl CommandChannel) {
        if let Some(tank) = &mut self.water_tank {
            tank.main_loop(io);
        }
        if let Some(jet) = &mut self.water_jet {
            jet.main_loop(io, commands);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Handle one console line.  Returns the reply lines, empty when no
    /// module claimed the line.
    pub fn handle_line(&mut self, line: &str, sink: &mut impl EventSink) -> Vec<String> {
        match AppCommand::parse(line) {
            AppCommand::Resume => self.resume(sink),
            AppCommand::MCode { code, .. } => self.handle_mcode(code, sink),
            AppCommand::Unknown(line) => {
                debug!("console: ignoring '{line}'");
                Vec::new()
            }
        }
    }

    fn handle_mcode(&mut self, code: u16, sink: &mut impl EventSink) -> Vec<String> {
        let mut replies: Vec<String> = self
            .counter_timers
            .iter_mut()
            .filter_map(|t| t.on_mcode(code, sink))
            .collect();
        if let Some(tank) = &mut self.water_tank {
            if tank.on_mcode(code, sink) {
                let word = if tank.is_enabled() { "enabled" } else { "disabled" };
                replies.push(format!("cutting_water_tank {word}"));
            }
        }
        if let Some(jet) = &mut self.water_jet {
            if let Some(lines) = jet.on_mcode(code, sink) {
                replies.extend(lines);
            }
        }
        if replies.is_empty() {
            debug!("console: M{code} not handled by any module");
        }
        replies
    }

    fn resume(&mut self, sink: &mut impl EventSink) -> Vec<String> {
        let mut any = false;
        if let Some(tank) = &mut self.water_tank {
            any |= tank.on_resume();
        }
        if let Some(jet) = &mut self.water_jet {
            any |= jet.on_resume();
        }
        if any {
            sink.emit(&AppEvent::Resumed);
            vec!["resumed".to_string()]
        } else {
            vec!["not suspended".to_string()]
        }
    }

    // ── Panel ─────────────────────────────────────────────────

    /// Bring the menu screen up at the root menu.
    pub fn open_menu(&mut self) {
        self.navigator.open();
    }

    pub fn display(
        &self,
        line: usize,
        fs: &impl MenuFs,
        machine: &impl MachineState,
    ) -> Result<DisplayLine> {
        self.navigator.display(line, fs, machine)
    }

    pub fn scroll(&mut self, delta: i32, fs: &impl MenuFs, machine: &impl MachineState) -> Result<usize> {
        self.navigator.scroll(delta, fs, machine)
    }

    /// Click display line `line`.  A `state <n>` line is forwarded to the
    /// water jet.
    pub fn click(
        &mut self,
        line: usize,
        fs: &impl MenuFs,
        machine: &impl MachineState,
        commands: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) -> Result<ClickOutcome> {
        let outcome = self.navigator.click(line, fs, machine, commands)?;
        if let ClickOutcome::StateRequested(raw) = outcome {
            match &mut self.water_jet {
                Some(jet) => jet.set_state_raw(raw, sink),
                None => warn!("menu: state {raw} requested but the water jet is not configured"),
            }
        }
        Ok(outcome)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Reports of every water module, water jet first.
    pub fn status_reports(&self) -> Vec<StatusReport> {
        let jet = self.water_jet.as_ref().map(WaterJet::status);
        let tank = self.water_tank.as_ref().map(WaterTank::status);
        jet.into_iter().chain(tank).collect()
    }

    /// Full console status: water modules, then one line per counter timer.
    pub fn status(&self) -> Vec<String> {
        let mut lines = vec![format!("uptime {}s", self.seconds)];
        for report in self.status_reports() {
            lines.extend(report.lines());
        }
        lines.extend(self.counter_timers.iter().map(CounterTimer::status_line));
        lines
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn counter_timers(&self) -> &[CounterTimer] {
        &self.counter_timers
    }

    pub fn water_tank(&self) -> Option<&WaterTank> {
        self.water_tank.as_ref()
    }

    pub fn water_jet(&self) -> Option<&WaterJet> {
        self.water_jet.as_ref()
    }

    /// A water module holds the machine suspended.
    pub fn is_suspended(&self) -> bool {
        self.water_tank.as_ref().is_some_and(WaterTank::is_paused)
            || self.water_jet.as_ref().is_some_and(WaterJet::is_paused)
    }

    /// Whether the water jet is inside a job; `None` without a water jet.
    pub fn job_running(&self) -> Option<bool> {
        self.water_jet.as_ref().map(|jet| jet.state().in_job())
    }

    /// Seconds ticked since construction.
    pub fn uptime_seconds(&self) -> u64 {
        self.seconds
    }
}

/// Keep a successfully built module, log why one was left out.
fn built<T>(module: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(m) => Some(m),
        Err(Error::Config(ConfigError::Disabled { .. })) => {
            debug!("{module}: disabled");
            None
        }
        Err(e) => {
            error!("{module}: not started: {e}");
            None
        }
    }
}
