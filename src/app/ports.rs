//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (pins, switches, the G-code queue, the panel, storage)
//! implement these traits.  The [`Controller`](super::service::Controller)
//! consumes them via generics injected at call sites, so the domain core
//! never touches hardware or the kernel directly.
//!
//! All port errors are the crate-wide [`Error`](crate::error::Error); every
//! call site either handles them or logs and aborts the current operation.

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::menu::Predicate;

// ───────────────────────────────────────────────────────────────
// Digital I/O facade (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// Named digital pins.  Pin names follow the board silkscreen (`P1.28`).
pub trait DigitalIo {
    /// Sample the current level of `pin`.
    fn read(&mut self, pin: &str) -> Result<bool>;

    /// Drive `pin` to `level`.
    fn write(&mut self, pin: &str, level: bool) -> Result<()>;

    /// Whether `pin` names a pin that exists on this board.
    fn is_connected(&self, pin: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Switch registry (driven adapter: domain ↔ switch modules)
// ───────────────────────────────────────────────────────────────

/// Named switches owned by other controller modules (spindle, coolant, …).
pub trait SwitchRegistry {
    fn get(&self, name: &str) -> Result<bool>;
    fn set(&mut self, name: &str, on: bool) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Command channel (driven adapter: domain → G-code queue)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget textual machine commands (`M600`, `G4 S2.0`, …).
pub trait CommandChannel {
    fn send(&mut self, command: &str);
}

// ───────────────────────────────────────────────────────────────
// Panel (driven adapter: domain → LCD menu)
// ───────────────────────────────────────────────────────────────

/// What the fault escalation needs from the operator panel.
pub trait PanelPort {
    /// Identity of the menu currently shown, if the menu screen is up.
    fn current_menu(&self) -> Option<&str>;

    /// Enter `path` and bring the menu screen up.
    fn show_menu(&mut self, path: &str);

    /// Orange-on/green-off when `fault`, green-on/orange-off otherwise.
    fn set_fault_indicator(&mut self, fault: bool);
}

// ───────────────────────────────────────────────────────────────
// Machine state (driven adapter: domain ← kernel)
// ───────────────────────────────────────────────────────────────

/// Live machine state consulted by menu predicates.
///
/// `Predicate::FileIsGcode` is answered by the navigator from its own
/// selection; adapters may return anything for it.
pub trait MachineState {
    fn holds(&self, predicate: Predicate) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Menu filesystem (driven adapter: domain ← SD card)
// ───────────────────────────────────────────────────────────────

/// One directory entry, in the order the filesystem reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// Read-only access to the removable storage holding menus and jobs.
pub trait MenuFs {
    /// Entries of `dir` in native enumeration order.
    fn list(&self, dir: &str) -> Result<Vec<DirEntry>>;

    /// Whole contents of the file at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ← persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads the controller configuration.
pub trait ConfigPort {
    /// Keys absent from the source take their documented defaults.
    fn load(&self) -> Result<ControllerConfig>;
}
