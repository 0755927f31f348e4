//! In-memory simulation backends.
//!
//! Used by the host simulator and by tests: a [`SimPin`] is an embedded-hal
//! pin whose level lives in a shared cell, so the operator (or a test) can
//! flip a float switch while the [`GpioBank`](super::gpio::GpioBank) owns
//! the pin.

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use log::info;

use crate::app::ports::{CommandChannel, MachineState};
use crate::app::Controller;
use crate::menu::Predicate;

// ── Pins ─────────────────────────────────────────────────────

/// A simulated pin.  Clones share the same level.
#[derive(Debug, Clone, Default)]
pub struct SimPin(Rc<Cell<bool>>);

impl SimPin {
    pub fn new(level: bool) -> Self {
        Self(Rc::new(Cell::new(level)))
    }

    pub fn level(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, level: bool) {
        self.0.set(level);
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

// ── Machine state ────────────────────────────────────────────

/// Machine state flags set by hand.
#[derive(Debug, Clone, Default)]
pub struct SimMachine {
    flags: [bool; Predicate::COUNT],
}

impl SimMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, predicate: Predicate, value: bool) {
        self.flags[predicate as usize] = value;
    }

    /// Follow the controller: suspended while a water module is paused,
    /// playing while a water-jet job runs.  Without a water jet `Playing`
    /// stays as set by hand.
    pub fn mirror(&mut self, controller: &Controller) {
        self.set(Predicate::Suspended, controller.is_suspended());
        if let Some(playing) = controller.job_running() {
            self.set(Predicate::Playing, playing);
        }
    }
}

impl MachineState for SimMachine {
    fn holds(&self, predicate: Predicate) -> bool {
        self.flags[predicate as usize]
    }
}

// ── Commands ─────────────────────────────────────────────────

/// Machine commands in send order, until drained.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<String>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every command sent since the last drain.
    pub fn drain(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }
}

impl CommandChannel for CommandQueue {
    fn send(&mut self, command: &str) {
        info!("gcode <- {command}");
        self.pending.push_back(command.to_string());
    }
}
