//! Fuzz target: `Controller::handle_line`
//!
//! Feeds arbitrary console text to a controller with every module
//! disabled and to the command parser.  Neither may panic.
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use cnc_interlock::app::Controller;
use cnc_interlock::app::commands::AppCommand;
use cnc_interlock::app::events::AppEvent;
use cnc_interlock::app::ports::{DigitalIo, EventSink};
use cnc_interlock::config::ControllerConfig;
use cnc_interlock::error::{IoError, Result};
use libfuzzer_sys::fuzz_target;

struct NoPins;

impl DigitalIo for NoPins {
    fn read(&mut self, _pin: &str) -> Result<bool> {
        Err(IoError::PinReadFailed.into())
    }

    fn write(&mut self, _pin: &str, _level: bool) -> Result<()> {
        Err(IoError::PinWriteFailed.into())
    }

    fn is_connected(&self, _pin: &str) -> bool {
        false
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let _ = AppCommand::parse(line);

    let mut controller = Controller::from_config(&ControllerConfig::default(), &NoPins);
    let _ = controller.handle_line(line, &mut Discard);
});
