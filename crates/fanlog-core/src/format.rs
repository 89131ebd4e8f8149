//! Text rendering for line-oriented sinks.
//!
//! Every dispatch renders exactly one line, shared by the terminal, debug
//! channel and file sinks:
//!
//! ```text
//! 2026/10/19 14:03:07.412 [ Warn  ] -> cache miss for key 42
//! 2026/10/19 14:03:07.415 [ Error ] -> store.rs >> flush() >> in line[ 88]: disk full
//! └───────── timestamp ──┘ └ tag ─┘    └───────── detail prefix ─────────┘
//! ```

use std::fmt::Write;

use crate::event::Event;
use crate::types::Severity;

/// Timestamp layout: `yyyy/M/d HH:mm:ss.fff` in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y/%-m/%-d %H:%M:%S%.3f";

/// Width the `"[ Name "` part of the severity tag is padded to.
const TAG_WIDTH: usize = 8;

/// Render the `[ Name  ]` tag for a severity.
pub fn severity_tag(severity: Severity) -> String {
    format!("{:<width$}]", format!("[ {} ", severity), width = TAG_WIDTH)
}

/// Render an event as a single line without trailing newline.
///
/// With `detail` set, the line carries a `file >> caller() >> in line[n]: `
/// prefix before the message. Missing provenance renders as empty text.
pub fn render_line(event: &Event, detail: bool) -> String {
    let mut line = String::with_capacity(64 + event.message().map_or(0, str::len));

    let _ = write!(
        line,
        "{} {} -> ",
        event.timestamp().format(TIMESTAMP_FORMAT),
        severity_tag(event.severity())
    );

    if detail {
        let _ = write!(
            line,
            "{} >> {}() >> in line[{:>3}]: ",
            event.file_name().unwrap_or_default(),
            event.caller().unwrap_or_default(),
            event.line().unwrap_or(0)
        );
    }

    line.push_str(event.message().unwrap_or_default());
    line
}

// ═══════════════════════════════════════════════════════════════════════
// Banner helpers
// ═══════════════════════════════════════════════════════════════════════

/// Center `text` in a run of `*` so the line is `width` columns wide.
///
/// Odd widths are rounded up to the next even number and odd-length text
/// gets a trailing space so both sides stay symmetric. Text that already
/// fills the width is returned unchanged.
///
/// ```
/// assert_eq!(fanlog_core::format::header("ab", 8), "***ab***\n");
/// ```
pub fn header(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let (body, side) = balance(text, width);
    format!("{stars}{body}{stars}\n", stars = "*".repeat(side))
}

/// Frame `text` as `*   text   *`, `width` columns wide.
///
/// ```
/// assert_eq!(fanlog_core::format::content("ab", 8), "*  ab  *\n");
/// ```
pub fn content(text: &str, width: usize) -> String {
    framed(text, width, "*")
}

/// Like [`content`] but with blank borders instead of `*`.
pub fn centered(text: &str, width: usize) -> String {
    framed(text, width, " ")
}

fn framed(text: &str, width: usize, border: &str) -> String {
    let len = text.chars().count();
    if len + 2 >= width {
        return text.to_string();
    }

    let (body, side) = balance(text, width);
    let gap = " ".repeat(side - 1);
    format!("{border}{gap}{body}{gap}{border}\n")
}

/// Pad `text` to even length and return it with the fill for each side.
fn balance(text: &str, width: usize) -> (String, usize) {
    let width = width + width % 2;
    let mut body = text.to_string();
    if body.chars().count() % 2 != 0 {
        body.push(' ');
    }
    let side = (width - body.chars().count()) / 2;
    (body, side)
}
