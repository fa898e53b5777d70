//! Line formatting and console echo
//!
//! Every entry is rendered once, at enqueue time, into the exact text that
//! later lands in the log file.

use std::fmt;

use chrono::{DateTime, Local};
use crossterm::style::{Color, Stylize};
use serde::{Deserialize, Serialize};

/// Timestamp layout embedded in every line (second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Get the label written into the line
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Color used when echoing to the console
    pub fn console_color(&self) -> Color {
        match self {
            Severity::Info => Color::Green,
            Severity::Warn => Color::Yellow,
            Severity::Error | Severity::Fatal => Color::Red,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a line as `[SEVERITY[/DEBUG]]: message - YYYY-MM-DD HH:MM:SS`
pub fn format_line(message: &str, severity: Severity, debug: bool, now: DateTime<Local>) -> String {
    let suffix = if debug { "/DEBUG" } else { "" };
    format!(
        "[{}{}]: {} - {}",
        severity.as_str(),
        suffix,
        message,
        now.format(TIMESTAMP_FORMAT)
    )
}

/// Print a formatted line to stdout in the severity's color.
///
/// Output errors are ignored; the echo must never hold up an enqueue.
pub fn echo(line: &str, severity: Severity) {
    use std::io::Write;

    let styled = line.with(severity.console_color());
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", styled);
}
