//! Arming and actuation policy.
//!
//! Given a threshold transition, the [`ActuationPolicy`] decides which
//! switches to drive and what happens to the module afterwards:
//!
//! | trigger | output is "on" when | after reaching THRESHOLD                       |
//! |---------|---------------------|------------------------------------------------|
//! | level   | state == THRESHOLD  | multi-shot keeps the switch on and counts again |
//! |         |                     | single-shot goes dormant                        |
//! | rising  | state == THRESHOLD  | fires once per arm                              |
//! | falling | state == BELOW      | fires once per arm                              |
//!
//! "On" drives each switch to its configured state, "off" to the opposite,
//! and an inverted module flips both.  No switch is touched unless the
//! module is armed, and a switch that already reports the target is left
//! alone.

use heapless::Vec;
use log::{error, warn};

use crate::app::ports::SwitchRegistry;
use crate::error::Result;

/// At most this many switches per module.
pub const MAX_SWITCHES: usize = 5;

// ---------------------------------------------------------------------------
// Threshold state
// ---------------------------------------------------------------------------

/// Logical state of a switch-timer style module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdState {
    /// Dormant; the counter does not advance.
    None,
    BelowThreshold,
    Threshold,
}

impl ThresholdState {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::BelowThreshold => "BELOW",
            Self::Threshold => "THRESHOLD",
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Level,
    Rising,
    Falling,
}

impl TriggerMode {
    /// Parse a configuration value.  `below` is the historical name of
    /// `falling`.  Unknown values fall back to `level`.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "level" => Self::Level,
            "rising" => Self::Rising,
            "falling" | "below" => Self::Falling,
            other => {
                warn!("unknown trigger mode '{other}', using level");
                Self::Level
            }
        }
    }

    pub fn is_edge(self) -> bool {
        self != Self::Level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    SingleShot,
    MultiShot,
}

impl Repeat {
    /// Parse a configuration value.  Unknown values fall back to `multishot`.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "singleshot" => Self::SingleShot,
            "multishot" => Self::MultiShot,
            other => {
                warn!("unknown timer type '{other}', using multishot");
                Self::MultiShot
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Arming
// ---------------------------------------------------------------------------

/// Arm/disarm bookkeeping.
///
/// Without an arm command the module is permanently armed and no disarm
/// path can clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arming {
    arm_code: Option<u16>,
    disarm_code: Option<u16>,
    armed: bool,
}

impl Arming {
    /// Codes of 0 mean "not configured".
    pub fn new(arm_code: u16, disarm_code: u16) -> Self {
        let arm_code = (arm_code != 0).then_some(arm_code);
        Self {
            arm_code,
            disarm_code: (disarm_code != 0).then_some(disarm_code),
            armed: arm_code.is_none(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether arming is under explicit command control.
    pub fn is_explicit(&self) -> bool {
        self.arm_code.is_some()
    }

    pub fn arm_code(&self) -> Option<u16> {
        self.arm_code
    }

    pub fn disarm_code(&self) -> Option<u16> {
        self.disarm_code
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Clear the armed flag.  Returns whether anything changed.
    pub fn disarm(&mut self) -> bool {
        if self.arm_code.is_none() || !self.armed {
            return false;
        }
        self.armed = false;
        true
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// One switch and the state it takes when the module triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchBinding {
    pub name: String,
    pub on_trigger: bool,
}

/// What the caller must do after [`ActuationPolicy::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actuation {
    /// State the module should store.
    pub next: ThresholdState,
    /// Restart the elapsed counter from zero.
    pub restart_counter: bool,
    /// Enter the module's notification menu.
    pub notify: bool,
    /// The module was disarmed by this call.
    pub disarmed: bool,
    /// Physical switch writes performed.
    pub writes: usize,
}

impl Actuation {
    fn hold(state: ThresholdState) -> Self {
        Self {
            next: state,
            restart_counter: false,
            notify: false,
            disarmed: false,
            writes: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActuationPolicy {
    trigger: TriggerMode,
    repeat: Repeat,
    inverted: bool,
    bindings: Vec<SwitchBinding, MAX_SWITCHES>,
}

impl ActuationPolicy {
    pub fn new(
        trigger: TriggerMode,
        repeat: Repeat,
        inverted: bool,
        bindings: Vec<SwitchBinding, MAX_SWITCHES>,
    ) -> Self {
        Self {
            trigger,
            repeat,
            inverted,
            bindings,
        }
    }

    pub fn trigger(&self) -> TriggerMode {
        self.trigger
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn bindings(&self) -> &[SwitchBinding] {
        &self.bindings
    }

    /// Act on a transition `from → to`.
    ///
    /// A transition to the same state does nothing.  On an I/O error the
    /// module's state must be left as it was; the error has already been
    /// logged.
    pub fn apply(
        &self,
        from: ThresholdState,
        to: ThresholdState,
        arming: &mut Arming,
        switches: &mut impl SwitchRegistry,
    ) -> Result<Actuation> {
        if from == to {
            return Ok(Actuation::hold(from));
        }

        let logical_on = match self.trigger {
            TriggerMode::Level | TriggerMode::Rising => to == ThresholdState::Threshold,
            TriggerMode::Falling => to == ThresholdState::BelowThreshold,
        };

        let was_armed = arming.is_armed();
        let writes = self.drive(logical_on, arming, switches)?;

        let mut out = Actuation::hold(to);
        out.writes = writes;

        // Edge triggers fire once per explicit arm.
        if was_armed && self.trigger.is_edge() {
            out.disarmed = arming.disarm();
        }

        if to == ThresholdState::Threshold {
            match (self.repeat, self.trigger) {
                (Repeat::SingleShot, _) => {
                    out.disarmed |= arming.disarm();
                    out.next = ThresholdState::None;
                    out.notify = true;
                }
                (Repeat::MultiShot, TriggerMode::Level) => {
                    // The switch stays on; only the count starts over.
                    out.next = ThresholdState::BelowThreshold;
                    out.restart_counter = true;
                }
                (Repeat::MultiShot, _) => {}
            }
        }

        Ok(out)
    }

    /// Drive every bound switch to its logical target.  Reads all switches
    /// before the first write so a read failure leaves nothing half-done.
    fn drive(
        &self,
        logical_on: bool,
        arming: &Arming,
        switches: &mut impl SwitchRegistry,
    ) -> Result<usize> {
        if !arming.is_armed() {
            return Ok(0);
        }

        let mut pending: Vec<(&str, bool), MAX_SWITCHES> = Vec::new();
        for binding in &self.bindings {
            let target = (if logical_on { binding.on_trigger } else { !binding.on_trigger }) ^ self.inverted;
            let current = switches.get(&binding.name).inspect_err(|e| {
                error!("switch '{}': {e}", binding.name);
            })?;
            if current != target {
                // Capacity equals the binding count.
                let _ = pending.push((binding.name.as_str(), target));
            }
        }

        let mut writes = 0;
        for (name, target) in pending {
            switches.set(name, target).inspect_err(|e| {
                error!("switch '{name}': {e}");
            })?;
            writes += 1;
        }
        Ok(writes)
    }
}
