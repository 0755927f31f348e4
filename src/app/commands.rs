//! Inbound commands to the controller.
//!
//! A console line is an M-code (`M1403`, optionally followed by words the
//! interlock modules ignore), the operator's resume, or anything else.

use crate::escalation::is_resume_line;

/// Commands the console can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// `M<code>` with whatever followed it on the line.
    MCode { code: u16, rest: String },

    /// The operator resumed a suspended machine (`resume` or `M601`).
    Resume,

    /// Not addressed to the interlock layer.
    Unknown(String),
}

impl AppCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if is_resume_line(line) {
            return Self::Resume;
        }
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let code = word
            .strip_prefix(['M', 'm'])
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok());
        match code {
            Some(code) => Self::MCode {
                code,
                rest: rest.trim().to_string(),
            },
            None => Self::Unknown(line.to_string()),
        }
    }
}
