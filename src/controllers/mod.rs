//! Interlock modules.
//!
//! Each module is built by a factory from its configuration section and is
//! driven by the host through the same three calls:
//!
//! | Call          | Rate    | Work                                   |
//! |---------------|---------|----------------------------------------|
//! | `poll`        | ~10 Hz  | sample inputs into the sensor cache    |
//! | `second_tick` | 1 Hz    | timers, threshold evaluation, faults   |
//! | `main_loop`   | free    | apply requested outputs, flush commands|
//!
//! plus `on_mcode` / `on_resume` for commands received on the console.

pub mod counter_timer;
pub mod water_jet;
pub mod water_tank;

use log::{error, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{CommandChannel, DigitalIo, EventSink, PanelPort};
use crate::config::pin_is_connected;
use crate::error::{ConfigError, LevelFault, Result};
use crate::escalation::{Escalation, FaultEscalator};

pub use counter_timer::CounterTimer;
pub use water_jet::WaterJet;
pub use water_tank::WaterTank;

// ---------------------------------------------------------------------------
// Configuration checks
// ---------------------------------------------------------------------------

/// Collects the missing keys of one module, logging each one.
pub(crate) struct ConfigCheck {
    module: &'static str,
    first_missing: Option<&'static str>,
}

impl ConfigCheck {
    pub(crate) fn new(module: &'static str) -> Self {
        Self {
            module,
            first_missing: None,
        }
    }

    /// The pin must be named and present on the board.
    pub(crate) fn pin(&mut self, key: &'static str, pin: &str, io: &impl DigitalIo) {
        if !pin_is_connected(pin) || !io.is_connected(pin) {
            self.missing(key);
        }
    }

    pub(crate) fn menu(&mut self, key: &'static str, path: &str) {
        if path.trim().is_empty() {
            self.missing(key);
        }
    }

    /// `Err` with the first missing key, if any.
    pub(crate) fn finish(self) -> Result<()> {
        match self.first_missing {
            Some(key) => Err(ConfigError::Missing {
                module: self.module,
                key,
            }
            .into()),
            None => Ok(()),
        }
    }

    fn missing(&mut self, key: &'static str) {
        error!(
            "*ERROR* {}",
            ConfigError::Missing {
                module: self.module,
                key
            }
        );
        self.first_missing.get_or_insert(key);
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// An output pin and the last level written to it.
pub(crate) struct OutputPin {
    pub(crate) pin: String,
    pub(crate) written: Option<bool>,
}

impl OutputPin {
    pub(crate) fn new(pin: &str) -> Self {
        Self {
            pin: pin.to_string(),
            written: None,
        }
    }

    /// Drive the pin when `level` is requested and differs from the last
    /// successful write.  A failed write is logged and retried next loop.
    pub(crate) fn apply(&mut self, level: Option<bool>, io: &mut impl DigitalIo) {
        let Some(level) = level else { return };
        if self.written == Some(level) {
            return;
        }
        match io.write(&self.pin, level) {
            Ok(()) => self.written = Some(level),
            Err(e) => warn!("{}: {e}", self.pin),
        }
    }
}

// ---------------------------------------------------------------------------
// Level alarm
// ---------------------------------------------------------------------------

/// Operator menus for the level faults of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultMenus {
    pub low_water: String,
    pub level_too_high: String,
    pub filters_blocked: String,
}

impl FaultMenus {
    /// A tank idle for too long shows the low-water menu.
    pub fn for_fault(&self, fault: LevelFault) -> &str {
        match fault {
            LevelFault::LowWater | LevelFault::TankIdleTooLong => &self.low_water,
            LevelFault::FiltersBlocked => &self.filters_blocked,
            LevelFault::LevelTooHigh => &self.level_too_high,
        }
    }
}

/// Fault escalation plus event bookkeeping for a water module.
pub(crate) struct LevelAlarm {
    pub(crate) escalator: FaultEscalator,
    menus: FaultMenus,
    last: Option<LevelFault>,
}

impl LevelAlarm {
    pub(crate) fn new(module: &'static str, delay_seconds: u32, menus: FaultMenus) -> Self {
        Self {
            escalator: FaultEscalator::new(module, delay_seconds),
            menus,
            last: None,
        }
    }

    /// Escalate `fault`, or report a clean evaluation when `None`.
    pub(crate) fn report(
        &mut self,
        fault: Option<LevelFault>,
        panel: &mut impl PanelPort,
        commands: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) -> Escalation {
        let module = self.escalator.module();
        let mut escalation = Escalation::default();
        match fault {
            Some(fault) => {
                let out = self
                    .escalator
                    .raise(fault, self.menus.for_fault(fault), panel, commands);
                if self.last != Some(fault) {
                    sink.emit(&AppEvent::FaultRaised { module, fault });
                }
                if out.suspended {
                    sink.emit(&AppEvent::Suspended { module });
                }
                escalation = out;
            }
            None => {
                self.escalator.all_clear(panel);
                if self.last.is_some() {
                    sink.emit(&AppEvent::FaultsCleared { module });
                }
            }
        }
        self.last = fault;
        escalation
    }

    pub(crate) fn menus(&self) -> &FaultMenus {
        &self.menus
    }
}
