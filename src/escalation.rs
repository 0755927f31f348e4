//! Fault escalation.
//!
//! Turns a level fault into operator-visible action:
//!
//! 1. The first raise while the machine is running sends the suspend
//!    command (`M600`) and marks the module paused.
//! 2. The fault menu is displayed, at most once per `delay_seconds` per
//!    module, and never when that very menu is already on screen.  A
//!    water-level-too-high fault pre-empts any other fault menu at once.
//! 3. The pause lasts until the operator resumes (`resume` / `M601`).
//!
//! Resuming does not clear the fault; an unresolved condition raises again
//! on the next evaluation.

use log::{info, warn};

use crate::app::ports::{CommandChannel, PanelPort};
use crate::error::LevelFault;
use crate::menu::trim_dir;

/// Machine-wide suspend command.
pub const SUSPEND_COMMAND: &str = "M600";

/// Clears a suspend.
pub const RESUME_COMMAND: &str = "M601";

/// Console lines that clear a pause.
pub fn is_resume_line(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("resume") || line.eq_ignore_ascii_case(RESUME_COMMAND)
}

/// What one call to [`FaultEscalator::raise`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escalation {
    pub suspended: bool,
    pub displayed: bool,
}

/// Per-module fault escalation state.
pub struct FaultEscalator {
    module: &'static str,
    delay_seconds: u32,
    /// Seconds since the last fault menu display; `None` before the first.
    since_display: Option<u32>,
    last_displayed: Option<LevelFault>,
    paused: bool,
    /// Last value written to the status LEDs.
    indicator: Option<bool>,
}

impl FaultEscalator {
    pub fn new(module: &'static str, delay_seconds: u32) -> Self {
        Self {
            module,
            delay_seconds,
            since_display: None,
            last_displayed: None,
            paused: false,
            indicator: None,
        }
    }

    /// Advance the display rate limiter by one second.
    pub fn tick(&mut self) {
        if let Some(s) = self.since_display.as_mut() {
            *s = s.saturating_add(1);
        }
    }

    /// Escalate `fault`, whose operator menu lives at `menu`.
    pub fn raise(
        &mut self,
        fault: LevelFault,
        menu: &str,
        panel: &mut impl PanelPort,
        commands: &mut impl CommandChannel,
    ) -> Escalation {
        let mut out = Escalation::default();

        if !self.paused {
            warn!("{}: {fault}, suspending", self.module);
            commands.send(SUSPEND_COMMAND);
            self.paused = true;
            out.suspended = true;
        }

        self.show_indicator(true, panel);

        if panel.current_menu().map(trim_dir) == Some(trim_dir(menu)) {
            return out;
        }

        let due = self.since_display.is_none_or(|s| s > self.delay_seconds);
        let preempts =
            fault == LevelFault::LevelTooHigh && self.last_displayed != Some(LevelFault::LevelTooHigh);
        if due || preempts {
            info!("{}: showing fault menu {menu}", self.module);
            panel.show_menu(menu);
            self.since_display = Some(0);
            self.last_displayed = Some(fault);
            out.displayed = true;
        }
        out
    }

    /// Record a clean evaluation: status LEDs back to green.
    pub fn all_clear(&mut self, panel: &mut impl PanelPort) {
        self.last_displayed = None;
        self.show_indicator(false, panel);
    }

    /// The operator resumed.  Returns whether this module was paused.
    pub fn resume(&mut self) -> bool {
        let was = self.paused;
        if was {
            info!("{}: resumed", self.module);
        }
        self.paused = false;
        was
    }

    /// Mark the machine paused without a fault (operator pause).
    pub fn mark_paused(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    fn show_indicator(&mut self, fault: bool, panel: &mut impl PanelPort) {
        if self.indicator != Some(fault) {
            panel.set_fault_indicator(fault);
            self.indicator = Some(fault);
        }
    }
}
