//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the serial console on the controller, stderr in the
//! simulator).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::Armed { timer } => info!("TIMER | {timer} armed"),
            AppEvent::Disarmed { timer } => info!("TIMER | {timer} disarmed"),
            AppEvent::Triggered { timer } => info!("TIMER | {timer} triggered"),
            AppEvent::FaultRaised { module, fault } => {
                warn!("FAULT | {module}: {fault} (0b{:04b})", fault.mask());
            }
            AppEvent::FaultsCleared { module } => info!("FAULT | {module}: all cleared"),
            AppEvent::Suspended { module } => warn!("PAUSE | suspended by {module}"),
            AppEvent::Resumed => info!("PAUSE | resumed"),
            AppEvent::StateChanged { from, to } => info!("STATE | {from} -> {to}"),
            AppEvent::ModuleEnabled { module, enabled } => {
                info!("MODULE | {module} {}", if *enabled { "enabled" } else { "disabled" });
            }
        }
    }
}
