//! Unified error types for the interlock controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! tick handlers' error handling uniform.  All variants are `Copy` so they
//! can be returned through the actuation policy and menu navigator without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A switch, pin or storage access failed.
    Io(IoError),
    /// A module's configuration is incomplete or invalid.
    Config(ConfigError),
    /// A value received from another layer has no meaning here.
    Logic(LogicError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Logic(e) => write!(f, "logic: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// I/O errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The switch registry could not report a switch state.
    SwitchReadFailed,
    /// The switch registry refused a state change.
    SwitchWriteFailed,
    /// A digital input could not be sampled.
    PinReadFailed,
    /// A digital output could not be driven.
    PinWriteFailed,
    /// A menu directory could not be enumerated.
    MenuDirUnreadable,
    /// A menu definition file could not be read.
    MenuFileUnreadable,
    /// The configuration source could not be read or decoded.
    ConfigUnreadable,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwitchReadFailed => write!(f, "failed to get switch state"),
            Self::SwitchWriteFailed => write!(f, "failed changing switch state"),
            Self::PinReadFailed => write!(f, "pin read failed"),
            Self::PinWriteFailed => write!(f, "pin write failed"),
            Self::MenuDirUnreadable => write!(f, "menu directory unreadable"),
            Self::MenuFileUnreadable => write!(f, "menu file unreadable"),
            Self::ConfigUnreadable => write!(f, "configuration unreadable"),
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Raised at construction time; the offending module is never activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The module's `enable` flag is false.
    Disabled { module: &'static str },
    /// A required key has no usable value.
    Missing {
        module: &'static str,
        key: &'static str,
    },
    /// A key is present but its value cannot be used.
    Invalid {
        module: &'static str,
        key: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled { module } => write!(f, "{module} is disabled"),
            Self::Missing { module, key } => {
                write!(f, "config missing definition for the {module}.{key}")
            }
            Self::Invalid { module, key } => write!(f, "invalid value for {module}.{key}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Logic errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicError {
    /// A process-state value outside the declared state set.
    BadState(u8),
}

impl fmt::Display for LogicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadState(raw) => write!(f, "unrecognised state value {raw}"),
        }
    }
}

impl From<LogicError> for Error {
    fn from(e: LogicError) -> Self {
        Self::Logic(e)
    }
}

// ---------------------------------------------------------------------------
// Level faults
// ---------------------------------------------------------------------------

/// Water-level faults are a special category: they escalate to a machine
/// suspend and an operator menu.  They are accumulated in a bitfield by the
/// level interlock so that simultaneous faults can be tracked and cleared
/// individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LevelFault {
    /// The fill cycle ran longer than allowed without reaching the middle float.
    LowWater = 0b0000_0001,
    /// The dump cycle ran longer than allowed; the filters are not draining.
    FiltersBlocked = 0b0000_0010,
    /// The tank has been filling for so long that it is considered idle.
    TankIdleTooLong = 0b0000_0100,
    /// The high float is wet.
    LevelTooHigh = 0b0000_1000,
}

impl LevelFault {
    /// Faults ordered from the highest display priority to the lowest.
    pub const BY_SEVERITY: [Self; 4] = [
        Self::LevelTooHigh,
        Self::TankIdleTooLong,
        Self::FiltersBlocked,
        Self::LowWater,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// The most severe fault set in `flags`, if any.
    pub fn most_severe(flags: u8) -> Option<Self> {
        Self::BY_SEVERITY
            .into_iter()
            .find(|fault| flags & fault.mask() != 0)
    }
}

impl fmt::Display for LevelFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowWater => write!(f, "low water"),
            Self::FiltersBlocked => write!(f, "filters blocked"),
            Self::TankIdleTooLong => write!(f, "water level too low for too long"),
            Self::LevelTooHigh => write!(f, "water level too high"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
