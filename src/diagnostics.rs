//! Module status reports.
//!
//! A [`StatusReport`] is the snapshot a module prints in reply to its status
//! M-code: state, pause flag, output levels and interlock timers, followed
//! by the module's command help.  It also serializes to JSON for the
//! console's `status --json`.

use core::fmt;

use serde::Serialize;

/// Level of one output pin as last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinReading {
    pub label: &'static str,
    pub pin: String,
    /// `None` until the pin has been driven once.
    pub on: Option<bool>,
}

/// One interlock or productive timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerReading {
    pub name: &'static str,
    pub elapsed: u32,
    /// Trigger limit in seconds, for timers that have one.
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub module: &'static str,
    pub previous_state: Option<&'static str>,
    pub current_state: &'static str,
    pub active: bool,
    pub suspended: bool,
    pub pins: Vec<PinReading>,
    pub timers: Vec<TimerReading>,
    #[serde(skip)]
    pub help: &'static [&'static str],
}

impl StatusReport {
    pub fn new(module: &'static str, current_state: &'static str) -> Self {
        Self {
            module,
            previous_state: None,
            current_state,
            active: false,
            suspended: false,
            pins: Vec::new(),
            timers: Vec::new(),
            help: &[],
        }
    }

    pub fn pin(mut self, label: &'static str, pin: &str, on: Option<bool>) -> Self {
        self.pins.push(PinReading {
            label,
            pin: pin.to_string(),
            on,
        });
        self
    }

    pub fn timer(mut self, name: &'static str, elapsed: u32, limit: Option<u32>) -> Self {
        self.timers.push(TimerReading {
            name,
            elapsed,
            limit,
        });
        self
    }

    /// The report as console reply lines.
    pub fn lines(&self) -> Vec<String> {
        self.to_string().lines().map(str::to_owned).collect()
    }

    pub fn to_json(&self) -> String {
        // Every field is a plain string, bool or integer.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.module)?;
        if let Some(previous) = self.previous_state {
            writeln!(f, "Previous State was {previous}")?;
        }
        writeln!(f, "Current  State  is {}", self.current_state)?;
        writeln!(f, "active {}", self.active)?;
        writeln!(f, "suspended {}", self.suspended)?;
        for p in &self.pins {
            let level = match p.on {
                Some(true) => "on",
                Some(false) => "off",
                None => "unset",
            };
            writeln!(f, "{} ({}) {level}", p.label, p.pin)?;
        }
        for t in &self.timers {
            match t.limit {
                Some(limit) => writeln!(f, "{} {} trigger limit {limit}", t.name, t.elapsed)?,
                None => writeln!(f, "{} {}", t.name, t.elapsed)?,
            }
        }
        for line in self.help {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
