//! Outbound application events.
//!
//! Interlock modules emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! the serial console, forward to a host, etc.

use crate::error::LevelFault;
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A counter timer was armed by its M-code.
    Armed { timer: String },

    /// A counter timer was disarmed (command or edge firing).
    Disarmed { timer: String },

    /// A counter timer reached its threshold and actuated its switches.
    Triggered { timer: String },

    /// A level fault was raised by a water module.
    FaultRaised {
        module: &'static str,
        fault: LevelFault,
    },

    /// Every level fault of a module has cleared.
    FaultsCleared { module: &'static str },

    /// A module suspended the machine.
    Suspended { module: &'static str },

    /// The operator resumed the machine.
    Resumed,

    /// The water-jet process FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A module was enabled or disabled at runtime.
    ModuleEnabled { module: &'static str, enabled: bool },
}
