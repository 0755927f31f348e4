//! LCD menu interpreter.
//!
//! A menu is a directory; every eligible entry in it is one line on the
//! display.  In menu mode an entry is a small definition file (see
//! [`parser`]); in file-browse mode entries are the job files and
//! sub-directories themselves.
//!
//! ```text
//!  MenuFs::list(dir) ──▶ candidates ──▶ parse ──▶ predicates hold? ──▶ line n
//!      (native order)   (no dotfiles,             (all of them)
//!                        extension filter)
//! ```
//!
//! Lines are never cached: every display or click re-reads the directory,
//! so predicates always see live machine state.

pub mod navigator;
pub mod parser;

use log::warn;

use crate::app::ports::{DirEntry, MachineState, MenuFs};
use crate::error::Result;

pub use navigator::{ClickOutcome, DisplayLine, Navigator, Screen, StatusLeds};
pub use parser::parse_menu_file;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Live conditions a menu line can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Predicate {
    Playing = 0,
    Halted = 1,
    Suspended = 2,
    FileIsGcode = 3,
    Extruder = 4,
    TemperatureControl = 5,
    Laser = 6,
    Cnc = 7,
}

impl Predicate {
    pub const COUNT: usize = 8;

    /// Map the part of an `only-if-…` directive after the prefix.
    pub fn from_directive(name: &str) -> Option<Self> {
        let name = name.strip_suffix("-is").unwrap_or(name);
        Some(match name {
            "playing" => Self::Playing,
            "halted" => Self::Halted,
            "suspended" => Self::Suspended,
            "file-is-gcode" => Self::FileIsGcode,
            "extruder" => Self::Extruder,
            "temperature-control" => Self::TemperatureControl,
            "laser" => Self::Laser,
            "cnc" => Self::Cnc,
            _ => return None,
        })
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Some(match idx {
            0 => Self::Playing,
            1 => Self::Halted,
            2 => Self::Suspended,
            3 => Self::FileIsGcode,
            4 => Self::Extruder,
            5 => Self::TemperatureControl,
            6 => Self::Laser,
            7 => Self::Cnc,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Actions and lines
// ---------------------------------------------------------------------------

/// What clicking a line does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Enter another menu directory.
    GotoMenu(String),
    /// Send `<command> <selected file>` to the machine.
    RunCommand(String),
    /// Leave the menu for the watch screen.
    GotoWatchScreen,
    /// Browse `start` for a job file, then enter `return_menu`.
    FileSelect { start: String, return_menu: String },
    /// Ask the process controller to enter a raw state value.
    SetState(u8),
}

/// One parsed menu line.  Rebuilt on every display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLine {
    pub label: String,
    pub is_title: bool,
    pub selectable: bool,
    /// Expected value per [`Predicate`]; `None` when not declared.
    pub predicates: [Option<bool>; Predicate::COUNT],
    pub action: Option<Action>,
}

impl Default for MenuLine {
    fn default() -> Self {
        Self {
            label: String::new(),
            is_title: false,
            selectable: true,
            predicates: [None; Predicate::COUNT],
            action: None,
        }
    }
}

impl MenuLine {
    /// All declared predicates hold.  `selected` is the file chosen in
    /// file-browse mode, consulted by `file-is-gcode`.
    pub fn is_eligible(&self, machine: &impl MachineState, selected: Option<&str>) -> bool {
        self.predicates
            .iter()
            .enumerate()
            .filter_map(|(i, expected)| Some((Predicate::from_index(i)?, (*expected)?)))
            .all(|(p, expected)| {
                let actual = match p {
                    Predicate::FileIsGcode => selected.is_some_and(is_gcode_name),
                    other => machine.holds(other),
                };
                actual == expected
            })
    }
}

// ---------------------------------------------------------------------------
// Directory scanning
// ---------------------------------------------------------------------------

/// Which directory entries count as lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    /// Menu definition files (`.txt`).  Directories are submenu containers
    /// reached through `goto-menu` and are not lines.
    MenuFiles,
    /// Job files (`.gcode`) and sub-directories.
    Gcode,
}

impl EntryFilter {
    pub fn extension(self) -> &'static str {
        match self {
            Self::MenuFiles => ".txt",
            Self::Gcode => ".gcode",
        }
    }

    pub fn accepts(self, entry: &DirEntry) -> bool {
        if entry.name.starts_with('.') {
            return false;
        }
        if entry.is_dir {
            return self == Self::Gcode;
        }
        has_extension(&entry.name, self.extension())
    }
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.len() > ext.len()
        && name
            .get(name.len() - ext.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(ext))
}

pub(crate) fn is_gcode_name(name: &str) -> bool {
    has_extension(name, EntryFilter::Gcode.extension())
}

/// Join a directory and an entry name with exactly one `/`.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Strip trailing `/`s, keeping a bare `/`.
pub fn trim_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        &path[..path.len().min(1)]
    } else {
        trimmed
    }
}

/// Candidate entries of `dir`, in native order.
pub fn candidates(fs: &impl MenuFs, dir: &str, filter: EntryFilter) -> Result<Vec<DirEntry>> {
    let entries = fs.list(dir)?;
    Ok(entries.into_iter().filter(|e| filter.accepts(e)).collect())
}

/// Parse the `ordinal`-th (1-based) menu file of `dir`.
///
/// Returns `Ok(None)` once the directory is exhausted.  A file that cannot
/// be read still occupies its ordinal, as a blank line.
pub fn resolve_line(
    fs: &impl MenuFs,
    dir: &str,
    ordinal: usize,
    language: &str,
) -> Result<Option<MenuLine>> {
    if ordinal == 0 {
        return Ok(None);
    }
    let Some(entry) = candidates(fs, dir, EntryFilter::MenuFiles)?
        .into_iter()
        .nth(ordinal - 1)
    else {
        return Ok(None);
    };

    let path = join_path(dir, &entry.name);
    match fs.read(&path) {
        Ok(bytes) => Ok(Some(parse_menu_file(&bytes, language))),
        Err(e) => {
            warn!("{path}: {e}");
            Ok(Some(MenuLine::default()))
        }
    }
}

/// The `n`-th (1-based) displayable menu line of `dir`: candidates whose
/// predicates fail are skipped.
pub fn nth_displayable(
    fs: &impl MenuFs,
    dir: &str,
    n: usize,
    language: &str,
    machine: &impl MachineState,
    selected: Option<&str>,
) -> Result<Option<MenuLine>> {
    let mut seen = 0;
    let mut ordinal = 1;
    while let Some(line) = resolve_line(fs, dir, ordinal, language)? {
        if line.is_eligible(machine, selected) {
            seen += 1;
            if seen == n {
                return Ok(Some(line));
            }
        }
        ordinal += 1;
    }
    Ok(None)
}

/// Number of displayable menu lines in `dir`.
pub fn count_displayable(
    fs: &impl MenuFs,
    dir: &str,
    language: &str,
    machine: &impl MachineState,
    selected: Option<&str>,
) -> Result<usize> {
    let mut count = 0;
    let mut ordinal = 1;
    while let Some(line) = resolve_line(fs, dir, ordinal, language)? {
        if line.is_eligible(machine, selected) {
            count += 1;
        }
        ordinal += 1;
    }
    Ok(count)
}
