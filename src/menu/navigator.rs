//! Menu navigator.
//!
//! Tracks where the operator is in the menu tree and turns display, click
//! and scroll events into interpreter calls or action execution.
//!
//! ```text
//!   Watch ──[open]──▶ Menu(root) ──[goto-menu]──▶ Menu(sub) ──[..]──▶ Menu(root)
//!                        │                           │
//!                        │                      [file-select]
//!                        │                           ▼
//!                        │                    FileBrowse(start) ──[file]──▶ Menu(return)
//!                        └──[..] / [run-command] / [display-watch-screen]──▶ Watch
//! ```
//!
//! Line 0 is always the synthetic `..` entry.

use log::{debug, info};

use super::{
    Action, EntryFilter, MenuLine, candidates, count_displayable, join_path, nth_displayable,
    trim_dir,
};
use crate::app::ports::{CommandChannel, MachineState, MenuFs, PanelPort};
use crate::error::Result;

/// Label of the synthetic line 0.
pub const UP_LABEL: &str = "..";

/// Which screen the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Watch,
}

/// Panel status LEDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusLeds {
    pub orange: bool,
    pub green: bool,
}

/// Where the operator is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorCursor {
    pub current_path: String,
    pub current_line_index: usize,
    /// Job file chosen in file-browse mode, used by `run-command`.
    pub pending_file_selection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Menu,
    FileBrowse {
        start: String,
        return_menu: String,
        origin: String,
    },
}

/// One rendered display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayLine {
    Up,
    Blank,
    Entry {
        label: String,
        is_title: bool,
        selectable: bool,
    },
}

impl DisplayLine {
    pub fn label(&self) -> &str {
        match self {
            Self::Up => UP_LABEL,
            Self::Blank => "",
            Self::Entry { label, .. } => label,
        }
    }
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing to do (blank or non-selectable line).
    Stayed,
    /// A different directory is now shown.
    Navigated,
    /// The panel switched to the watch screen.
    LeftMenu,
    /// A command went to the machine.
    CommandSent(String),
    /// A job file was chosen.
    FileSelected(String),
    /// A line asked the process controller for a raw state.
    StateRequested(u8),
}

pub struct Navigator {
    root: String,
    language: String,
    cursor: NavigatorCursor,
    selected_size: u64,
    mode: Mode,
    screen: Screen,
    leds: StatusLeds,
}

impl Navigator {
    /// Start on the watch screen with the cursor at `root`.
    pub fn new(root: &str, language: &str) -> Self {
        let root = trim_dir(root).to_string();
        Self {
            cursor: NavigatorCursor {
                current_path: root.clone(),
                current_line_index: 0,
                pending_file_selection: None,
            },
            root,
            language: language.to_string(),
            selected_size: 0,
            mode: Mode::Menu,
            screen: Screen::Watch,
            leds: StatusLeds::default(),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn cursor(&self) -> &NavigatorCursor {
        &self.cursor
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn leds(&self) -> StatusLeds {
        self.leds
    }

    pub fn is_browsing(&self) -> bool {
        matches!(self.mode, Mode::FileBrowse { .. })
    }

    /// Displayable lines in the current directory, `..` included.
    pub fn line_count(&self, fs: &impl MenuFs, machine: &impl MachineState) -> Result<usize> {
        let n = if self.is_browsing() {
            candidates(fs, &self.cursor.current_path, EntryFilter::Gcode)?.len()
        } else {
            count_displayable(
                fs,
                &self.cursor.current_path,
                &self.language,
                machine,
                self.cursor.pending_file_selection.as_deref(),
            )?
        };
        Ok(n + 1)
    }

    // ── Navigation ────────────────────────────────────────────

    /// Bring up the root menu.
    pub fn open(&mut self) {
        self.mode = Mode::Menu;
        self.enter_folder(&self.root.clone());
        self.screen = Screen::Menu;
    }

    /// Make `path` the current directory with the cursor on line 0.
    pub fn enter_folder(&mut self, path: &str) {
        let path = trim_dir(path);
        debug!("menu: entering {path}");
        if path == self.root && !self.is_browsing() {
            self.reset_cursor();
        } else {
            self.cursor.current_path = path.to_string();
            self.cursor.current_line_index = 0;
        }
    }

    /// Move the cursor by `delta` lines, clamped to the directory.
    pub fn scroll(
        &mut self,
        delta: i32,
        fs: &impl MenuFs,
        machine: &impl MachineState,
    ) -> Result<usize> {
        let last = self.line_count(fs, machine)?.saturating_sub(1);
        let target = self.cursor.current_line_index as i64 + i64::from(delta);
        self.cursor.current_line_index = target.clamp(0, last as i64) as usize;
        Ok(self.cursor.current_line_index)
    }

    /// Render display line `line`.
    pub fn display(
        &self,
        line: usize,
        fs: &impl MenuFs,
        machine: &impl MachineState,
    ) -> Result<DisplayLine> {
        if line == 0 {
            return Ok(DisplayLine::Up);
        }
        if self.is_browsing() {
            let entry = candidates(fs, &self.cursor.current_path, EntryFilter::Gcode)?
                .into_iter()
                .nth(line - 1);
            return Ok(entry.map_or(DisplayLine::Blank, |e| DisplayLine::Entry {
                label: if e.is_dir { format!("{}/", e.name) } else { e.name },
                is_title: false,
                selectable: true,
            }));
        }
        Ok(self
            .resolve(line, fs, machine)?
            .map_or(DisplayLine::Blank, |l| DisplayLine::Entry {
                label: self.substitute(&l.label),
                is_title: l.is_title,
                selectable: l.selectable,
            }))
    }

    /// Execute display line `line`.
    pub fn click(
        &mut self,
        line: usize,
        fs: &impl MenuFs,
        machine: &impl MachineState,
        commands: &mut impl CommandChannel,
    ) -> Result<ClickOutcome> {
        self.cursor.current_line_index = line;
        if line == 0 {
            return Ok(self.go_up());
        }
        if self.is_browsing() {
            return self.click_file(line, fs);
        }

        let Some(menu_line) = self.resolve(line, fs, machine)? else {
            return Ok(ClickOutcome::Stayed);
        };
        let (true, Some(action)) = (menu_line.selectable, menu_line.action) else {
            return Ok(ClickOutcome::Stayed);
        };

        Ok(match action {
            Action::GotoMenu(path) => {
                self.enter_folder(&path);
                ClickOutcome::Navigated
            }
            Action::RunCommand(command) => {
                let command = match &self.cursor.pending_file_selection {
                    Some(file) => format!("{command} {file}"),
                    None => command,
                };
                info!("menu: running '{command}'");
                commands.send(&command);
                self.leave_to_watch();
                ClickOutcome::CommandSent(command)
            }
            Action::GotoWatchScreen => {
                self.leave_to_watch();
                ClickOutcome::LeftMenu
            }
            Action::FileSelect { start, return_menu } => {
                self.mode = Mode::FileBrowse {
                    start: trim_dir(&start).to_string(),
                    return_menu,
                    origin: self.cursor.current_path.clone(),
                };
                self.enter_folder(&start);
                ClickOutcome::Navigated
            }
            Action::SetState(raw) => ClickOutcome::StateRequested(raw),
        })
    }

    // ── Internal ──────────────────────────────────────────────

    fn resolve(
        &self,
        line: usize,
        fs: &impl MenuFs,
        machine: &impl MachineState,
    ) -> Result<Option<MenuLine>> {
        nth_displayable(
            fs,
            &self.cursor.current_path,
            line,
            &self.language,
            machine,
            self.cursor.pending_file_selection.as_deref(),
        )
    }

    fn click_file(&mut self, line: usize, fs: &impl MenuFs) -> Result<ClickOutcome> {
        let Some(entry) = candidates(fs, &self.cursor.current_path, EntryFilter::Gcode)?
            .into_iter()
            .nth(line - 1)
        else {
            return Ok(ClickOutcome::Stayed);
        };
        let path = join_path(&self.cursor.current_path, &entry.name);
        if entry.is_dir {
            self.enter_folder(&path);
            return Ok(ClickOutcome::Navigated);
        }

        let Mode::FileBrowse { return_menu, .. } = std::mem::replace(&mut self.mode, Mode::Menu)
        else {
            return Ok(ClickOutcome::Stayed);
        };
        info!("menu: selected {path}");
        self.enter_folder(&return_menu);
        self.cursor.pending_file_selection = Some(path.clone());
        self.selected_size = entry.size;
        Ok(ClickOutcome::FileSelected(path))
    }

    fn go_up(&mut self) -> ClickOutcome {
        if let Mode::FileBrowse { start, origin, .. } = &self.mode {
            if self.cursor.current_path == *start {
                let origin = origin.clone();
                self.mode = Mode::Menu;
                self.enter_folder(&origin);
            } else {
                let parent = parent_of(&self.cursor.current_path).to_string();
                self.enter_folder(&parent);
            }
            return ClickOutcome::Navigated;
        }

        if self.cursor.current_path == self.root {
            self.leave_to_watch();
            return ClickOutcome::LeftMenu;
        }
        let parent = parent_of(&self.cursor.current_path);
        let parent = if parent.starts_with(&self.root) {
            parent.to_string()
        } else {
            self.root.clone()
        };
        self.enter_folder(&parent);
        ClickOutcome::Navigated
    }

    fn leave_to_watch(&mut self) {
        self.mode = Mode::Menu;
        self.reset_cursor();
        self.screen = Screen::Watch;
    }

    fn reset_cursor(&mut self) {
        self.cursor = NavigatorCursor {
            current_path: self.root.clone(),
            current_line_index: 0,
            pending_file_selection: None,
        };
        self.selected_size = 0;
    }

    /// `*f` becomes the selected file name, `*s` its size.
    fn substitute(&self, label: &str) -> String {
        let Some(path) = &self.cursor.pending_file_selection else {
            return label.to_string();
        };
        let name = path.rsplit('/').next().unwrap_or(path);
        label
            .replace("*f", name)
            .replace("*s", &self.selected_size.to_string())
    }
}

// ───────────────────────────────────────────────────────────────
// PanelPort
// ───────────────────────────────────────────────────────────────

impl PanelPort for Navigator {
    fn current_menu(&self) -> Option<&str> {
        (self.screen == Screen::Menu && !self.is_browsing())
            .then_some(self.cursor.current_path.as_str())
    }

    fn show_menu(&mut self, path: &str) {
        self.mode = Mode::Menu;
        self.enter_folder(path);
        self.screen = Screen::Menu;
    }

    fn set_fault_indicator(&mut self, fault: bool) {
        self.leds = StatusLeds {
            orange: fault,
            green: !fault,
        };
    }
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => path,
    }
}
