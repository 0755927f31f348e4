//! Mock hardware adapters for integration tests.
//!
//! Records every pin write, switch change, machine command and panel call
//! so tests can assert on the full history without real GPIO.

use std::collections::BTreeMap;

use cnc_interlock::app::events::AppEvent;
use cnc_interlock::app::ports::{
    CommandChannel, DigitalIo, DirEntry, EventSink, MachineState, MenuFs, PanelPort,
    SwitchRegistry,
};
use cnc_interlock::error::{IoError, Result};
use cnc_interlock::menu::Predicate;
use cnc_interlock::menu::join_path;

// ── Pins ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockBoard {
    pub levels: BTreeMap<String, bool>,
    pub writes: Vec<(String, bool)>,
    /// Pins that are not on the board.
    pub absent: Vec<String>,
    pub fail_reads: bool,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pin: &str, level: bool) {
        self.levels.insert(pin.to_string(), level);
    }

    pub fn level(&self, pin: &str) -> Option<bool> {
        self.levels.get(pin).copied()
    }

    pub fn writes_to(&self, pin: &str) -> Vec<bool> {
        self.writes
            .iter()
            .filter(|(p, _)| p == pin)
            .map(|(_, l)| *l)
            .collect()
    }
}

impl DigitalIo for MockBoard {
    fn read(&mut self, pin: &str) -> Result<bool> {
        if self.fail_reads {
            return Err(IoError::PinReadFailed.into());
        }
        Ok(self.level(pin).unwrap_or(false))
    }

    fn write(&mut self, pin: &str, level: bool) -> Result<()> {
        self.writes.push((pin.to_string(), level));
        self.set(pin, level);
        Ok(())
    }

    fn is_connected(&self, pin: &str) -> bool {
        !self.absent.iter().any(|p| p == pin)
    }
}

// ── Switches ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockSwitches {
    pub states: BTreeMap<String, bool>,
    pub history: Vec<(String, bool)>,
    pub refuse_writes: bool,
}

impl SwitchRegistry for MockSwitches {
    fn get(&self, name: &str) -> Result<bool> {
        Ok(self.states.get(name).copied().unwrap_or(false))
    }

    fn set(&mut self, name: &str, on: bool) -> Result<()> {
        if self.refuse_writes {
            return Err(IoError::SwitchWriteFailed.into());
        }
        self.history.push((name.to_string(), on));
        self.states.insert(name.to_string(), on);
        Ok(())
    }
}

// ── Commands ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockCommands {
    pub sent: Vec<String>,
}

#[allow(dead_code)]
impl MockCommands {
    pub fn count(&self, command: &str) -> usize {
        self.sent.iter().filter(|c| *c == command).count()
    }
}

impl CommandChannel for MockCommands {
    fn send(&mut self, command: &str) {
        self.sent.push(command.to_string());
    }
}

// ── Panel ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPanel {
    /// Menu the test pretends is on screen.
    pub showing: Option<String>,
    pub shown: Vec<String>,
    pub indicator: Vec<bool>,
    /// Whether `show_menu` puts the menu on screen.
    pub sticky: bool,
}

impl PanelPort for MockPanel {
    fn current_menu(&self) -> Option<&str> {
        self.showing.as_deref()
    }

    fn show_menu(&mut self, path: &str) {
        self.shown.push(path.to_string());
        if self.sticky {
            self.showing = Some(path.to_string());
        }
    }

    fn set_fault_indicator(&mut self, fault: bool) {
        self.indicator.push(fault);
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Machine state ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockMachine {
    pub playing: bool,
    pub halted: bool,
}

impl MachineState for MockMachine {
    fn holds(&self, predicate: Predicate) -> bool {
        match predicate {
            Predicate::Playing => self.playing,
            Predicate::Halted => self.halted,
            Predicate::Cnc => true,
            _ => false,
        }
    }
}

// ── Menu filesystem ───────────────────────────────────────────

/// In-memory card; directories list entries in insertion order.
#[derive(Debug, Default)]
pub struct MemCard {
    dirs: BTreeMap<String, Vec<DirEntry>>,
    files: BTreeMap<String, Vec<u8>>,
}

#[allow(dead_code)]
impl MemCard {
    pub fn file(&mut self, dir: &str, name: &str, body: &str) -> &mut Self {
        self.dirs.entry(dir.to_string()).or_default().push(DirEntry {
            name: name.to_string(),
            is_dir: false,
            size: body.len() as u64,
        });
        self.files.insert(join_path(dir, name), body.as_bytes().to_vec());
        self
    }

    pub fn dir(&mut self, parent: &str, name: &str) -> &mut Self {
        self.dirs.entry(parent.to_string()).or_default().push(DirEntry {
            name: name.to_string(),
            is_dir: true,
            size: 0,
        });
        self.dirs.entry(join_path(parent, name)).or_default();
        self
    }
}

impl MenuFs for MemCard {
    fn list(&self, dir: &str) -> Result<Vec<DirEntry>> {
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| IoError::MenuDirUnreadable.into())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| IoError::MenuFileUnreadable.into())
    }
}
