//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] by reading a JSON document from disk.  Keys
//! absent from the file take their defaults; a file that does not parse
//! is rejected as a whole.

use std::fs;
use std::path::PathBuf;

use log::{error, info};

use crate::app::ports::ConfigPort;
use crate::config::ControllerConfig;
use crate::error::{ConfigError, IoError, Result};

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Decode a configuration document.
    pub fn parse(text: &str) -> Result<ControllerConfig> {
        serde_json::from_str(text).map_err(|e| {
            error!("*ERROR* config: {e}");
            ConfigError::Invalid {
                module: "config",
                key: "json",
            }
            .into()
        })
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<ControllerConfig> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            error!("*ERROR* config {}: {e}", self.path.display());
            IoError::ConfigUnreadable
        })?;
        let cfg = Self::parse(&text)?;
        info!(
            "config {}: {} counter timer section(s)",
            self.path.display(),
            cfg.counter_timers.len()
        );
        Ok(cfg)
    }
}
