//! embedded-hal GPIO bank.
//!
//! Implements [`DigitalIo`] over named embedded-hal 1.0 pins.  Inputs are
//! [`InputPin`]s; outputs are [`StatefulOutputPin`]s so that reading an
//! output returns the level last driven.  A pin that was never registered
//! is "not connected", which is what module validation checks against.

use std::collections::BTreeMap;

use embedded_hal::digital::{InputPin, PinState, StatefulOutputPin};
use log::{debug, warn};

use crate::app::ports::DigitalIo;
use crate::error::{IoError, Result};

/// One registered pin, type-erased.
trait Line {
    fn read(&mut self) -> Result<bool>;
    fn write(&mut self, level: bool) -> Result<()>;
}

struct Input<P>(P);

impl<P: InputPin> Line for Input<P> {
    fn read(&mut self) -> Result<bool> {
        self.0.is_high().map_err(|_| IoError::PinReadFailed.into())
    }

    fn write(&mut self, _level: bool) -> Result<()> {
        Err(IoError::PinWriteFailed.into())
    }
}

struct Output<P>(P);

impl<P: StatefulOutputPin> Line for Output<P> {
    fn read(&mut self) -> Result<bool> {
        self.0.is_set_high().map_err(|_| IoError::PinReadFailed.into())
    }

    fn write(&mut self, level: bool) -> Result<()> {
        self.0
            .set_state(PinState::from(level))
            .map_err(|_| IoError::PinWriteFailed.into())
    }
}

/// Pins of the controller board, by silkscreen name.
#[derive(Default)]
pub struct GpioBank {
    pins: BTreeMap<String, Box<dyn Line>>,
}

impl GpioBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input.  A second registration under the same name
    /// replaces the first.
    pub fn add_input(&mut self, name: &str, pin: impl InputPin + 'static) {
        debug!("gpio: {name} input");
        self.pins.insert(name.to_string(), Box::new(Input(pin)));
    }

    pub fn add_output(&mut self, name: &str, pin: impl StatefulOutputPin + 'static) {
        debug!("gpio: {name} output");
        self.pins.insert(name.to_string(), Box::new(Output(pin)));
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }
}

impl DigitalIo for GpioBank {
    fn read(&mut self, pin: &str) -> Result<bool> {
        let Some(line) = self.pins.get_mut(pin) else {
            warn!("gpio: read of unknown pin {pin}");
            return Err(IoError::PinReadFailed.into());
        };
        line.read()
    }

    fn write(&mut self, pin: &str, level: bool) -> Result<()> {
        let Some(line) = self.pins.get_mut(pin) else {
            warn!("gpio: write to unknown pin {pin}");
            return Err(IoError::PinWriteFailed.into());
        };
        line.write(level)
    }

    fn is_connected(&self, pin: &str) -> bool {
        self.pins.contains_key(pin)
    }
}
