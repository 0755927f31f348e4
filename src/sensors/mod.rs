//! Float and door sensor sampling.
//!
//! The poll tick (~10 Hz) samples the pins and stores the levels in an
//! atomic cache; the second tick reads the cache.  One writer, one reader;
//! a value may be one poll interval stale.
//!
//! A failed read is logged and the previous good value is retained.

use core::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use crate::app::ports::DigitalIo;
use crate::safety::FloatSnapshot;

/// One cached digital input.
struct CachedInput {
    pin: String,
    level: AtomicBool,
}

impl CachedInput {
    fn new(pin: &str, initial: bool) -> Self {
        Self {
            pin: pin.to_string(),
            level: AtomicBool::new(initial),
        }
    }

    fn sample(&self, io: &mut impl DigitalIo) {
        match io.read(&self.pin) {
            Ok(level) => self.level.store(level, Ordering::Release),
            Err(e) => warn!("{}: {e}, keeping last value", self.pin),
        }
    }

    fn get(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

/// Cached float sensors (and optionally a door switch) of one module.
pub struct FloatSensors {
    middle: CachedInput,
    high: CachedInput,
    door: Option<CachedInput>,
}

impl FloatSensors {
    /// Floats start dry and the door starts open until the first poll.
    pub fn new(middle_pin: &str, high_pin: &str, door_pin: Option<&str>) -> Self {
        Self {
            middle: CachedInput::new(middle_pin, false),
            high: CachedInput::new(high_pin, false),
            door: door_pin.map(|p| CachedInput::new(p, false)),
        }
    }

    /// Sample every input.  Called from the poll tick.
    pub fn poll(&self, io: &mut impl DigitalIo) {
        self.middle.sample(io);
        self.high.sample(io);
        if let Some(door) = &self.door {
            door.sample(io);
        }
    }

    /// Latest float readings.
    pub fn snapshot(&self) -> FloatSnapshot {
        FloatSnapshot {
            middle: self.middle.get(),
            high: self.high.get(),
        }
    }

    /// `true` when the door switch reports closed.  Modules without a door
    /// switch always report closed.
    pub fn door_closed(&self) -> bool {
        self.door.as_ref().is_none_or(CachedInput::get)
    }

    pub fn door_pin(&self) -> Option<&str> {
        self.door.as_ref().map(|d| d.pin.as_str())
    }
}
