//! SD card adapter.
//!
//! Implements [`MenuFs`] over a host directory standing in for the card.
//! Menu paths are absolute card paths (`/sd/menu/main`); the `/sd` mount
//! prefix is mapped onto the root directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::{DirEntry, MenuFs};
use crate::error::{IoError, Result};

const MOUNT_POINT: &str = "/sd";

pub struct SdCardFs {
    root: PathBuf,
}

impl SdCardFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path of a card path.
    pub fn host_path(&self, card_path: &str) -> PathBuf {
        let relative = card_path
            .strip_prefix(MOUNT_POINT)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(card_path)
            .trim_start_matches('/');
        self.root.join(relative)
    }
}

impl MenuFs for SdCardFs {
    fn list(&self, dir: &str) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(self.host_path(dir)).map_err(|e| {
            warn!("sd: cannot list {dir}: {e}");
            IoError::MenuDirUnreadable
        })?;

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                warn!("sd: {dir}: {e}");
                IoError::MenuDirUnreadable
            })?;
            let Ok(meta) = entry.metadata() else {
                warn!("sd: {dir}: no metadata for {:?}, skipped", entry.file_name());
                continue;
            };
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
            });
        }
        Ok(out)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.host_path(path)).map_err(|e| {
            warn!("sd: cannot read {path}: {e}");
            IoError::MenuFileUnreadable.into()
        })
    }
}
