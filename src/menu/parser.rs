//! Menu definition file parser.
//!
//! One file defines one menu line.  Each text line holds one directive;
//! the first whitespace-delimited token names it:
//!
//! ```text
//! # comment
//! label-en Cut *f
//! only-if-playing-is 0
//! only-if-file-is-gcode 1
//! is-title
//! not-selectable
//! action run-command play
//! action goto-menu /sd/menu/main/jobs
//! action display-watch-screen
//! action state 3
//! file-select /sd/jobs /sd/menu/main/job
//! ```
//!
//! Lines longer than [`MAX_LINE_LEN`] are discarded whole.  A predicate
//! given twice keeps the last value.  Unknown directives are logged and
//! ignored; a file with nothing recognised is still a line with an empty
//! label.

use log::warn;

use super::{Action, MenuLine, Predicate};

/// Longest directive line accepted, in bytes.
pub const MAX_LINE_LEN: usize = 128;

/// Parse one menu definition file, keeping labels for `language`.
pub fn parse_menu_file(bytes: &[u8], language: &str) -> MenuLine {
    let mut line = MenuLine::default();
    let label_key = format!("label-{language}");

    for raw in bytes.split(|&b| b == b'\n') {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.len() > MAX_LINE_LEN {
            warn!("menu line of {} bytes discarded", raw.len());
            continue;
        }
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let (directive, rest) = match text.split_once(char::is_whitespace) {
            Some((d, r)) => (d, r.trim()),
            None => (text, ""),
        };

        if directive == label_key {
            line.label = rest.to_string();
        } else if directive.starts_with("label-") {
            // Another language.
        } else if let Some(name) = directive.strip_prefix("only-if-") {
            match Predicate::from_directive(name) {
                Some(p) => line.predicates[p as usize] = Some(parse_flag(rest)),
                None => warn!("unknown menu predicate '{directive}'"),
            }
        } else {
            match directive {
                "is-title" => line.is_title = true,
                "not-selectable" => line.selectable = false,
                "action" => line.action = parse_action(rest),
                "file-select" => line.action = parse_file_select(rest),
                _ => warn!("unknown menu directive '{directive}'"),
            }
        }
    }
    line
}

/// A flag is true when its value starts with `1`.
fn parse_flag(value: &str) -> bool {
    value.starts_with('1')
}

fn parse_action(rest: &str) -> Option<Action> {
    let (kind, param) = match rest.split_once(char::is_whitespace) {
        Some((k, p)) => (k, p.trim()),
        None => (rest, ""),
    };
    match kind.to_ascii_lowercase().as_str() {
        "goto-menu" if !param.is_empty() => Some(Action::GotoMenu(param.to_string())),
        "run-command" if !param.is_empty() => Some(Action::RunCommand(param.to_string())),
        "display-watch-screen" => Some(Action::GotoWatchScreen),
        "file-select" => parse_file_select(param),
        "state" => match param.parse::<u32>() {
            Ok(raw) => Some(Action::SetState(u8::try_from(raw).unwrap_or(u8::MAX))),
            Err(_) => {
                warn!("menu action 'state' needs a number, got '{param}'");
                None
            }
        },
        _ => {
            warn!("unsupported menu action '{rest}'");
            None
        }
    }
}

fn parse_file_select(rest: &str) -> Option<Action> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(start), Some(return_menu)) => Some(Action::FileSelect {
            start: start.to_string(),
            return_menu: return_menu.to_string(),
        }),
        _ => {
            warn!("file-select needs a start directory and a return menu");
            None
        }
    }
}
