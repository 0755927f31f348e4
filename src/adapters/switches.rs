//! In-memory switch registry.
//!
//! Stands in for the switch modules of the machine (spindle, mist,
//! flood, …) that counter timers drive by name.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::app::ports::SwitchRegistry;
use crate::error::{IoError, Result};

#[derive(Debug, Clone, Default)]
pub struct SwitchBank {
    states: BTreeMap<String, bool>,
}

impl SwitchBank {
    /// A bank with `names` registered, all off.
    pub fn with_switches<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            states: names.into_iter().map(|n| (n.to_string(), false)).collect(),
        }
    }

    pub fn register(&mut self, name: &str) {
        self.states.entry(name.to_string()).or_insert(false);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.states.iter().map(|(n, on)| (n.as_str(), *on))
    }
}

impl SwitchRegistry for SwitchBank {
    fn get(&self, name: &str) -> Result<bool> {
        self.states.get(name).copied().ok_or_else(|| {
            warn!("switch {name}: unknown");
            IoError::SwitchReadFailed.into()
        })
    }

    fn set(&mut self, name: &str, on: bool) -> Result<()> {
        let Some(state) = self.states.get_mut(name) else {
            warn!("switch {name}: unknown");
            return Err(IoError::SwitchWriteFailed.into());
        };
        if *state != on {
            info!("switch {name} -> {}", if on { "on" } else { "off" });
        }
        *state = on;
        Ok(())
    }
}
