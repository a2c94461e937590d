//! Exposition Format Rendering
//!
//! Renders one measured volume as a single metric line:
//!
//! ```text
//! docker_volume_size_bytes{name="…",mountpoint="…"[,project="…"][,volume="…"]} <bytes>
//! ```
//!
//! `project` and `volume` are only present when the corresponding Docker Compose
//! label is non-empty. Label values are quoted with Go's `strconv.Quote` rules so
//! arbitrary volume names and paths cannot break the line.

use crate::collector::ProbeResult;
use crate::docker::types::{COMPOSE_PROJECT_LABEL, COMPOSE_VOLUME_LABEL};
use std::fmt::Write;
use unicode_general_category::{get_general_category, GeneralCategory};

pub const METRIC_NAME: &str = "docker_volume_size_bytes";

/// Formats one probe result as a newline-terminated metric line
pub fn format_metric(result: &ProbeResult) -> String {
    let mut line = String::with_capacity(96);

    line.push_str(METRIC_NAME);
    line.push_str("{name=");
    push_quoted(&mut line, &result.volume.name);
    line.push_str(",mountpoint=");
    push_quoted(&mut line, &result.path);

    let project = result.volume.label(COMPOSE_PROJECT_LABEL);
    if !project.is_empty() {
        line.push_str(",project=");
        push_quoted(&mut line, project);
    }

    let volume = result.volume.label(COMPOSE_VOLUME_LABEL);
    if !volume.is_empty() {
        line.push_str(",volume=");
        push_quoted(&mut line, volume);
    }

    let _ = write!(line, "}} {}", result.size_bytes);
    line.push('\n');
    line
}

/// Double-quotes `value`, escaping like Go's `strconv.Quote`
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    push_quoted(&mut out, value);
    out
}

fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0B}' => out.push_str("\\v"),
            c if c < ' ' || c == '\u{7F}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if !is_printable(c) => {
                if (c as u32) < 0x10000 {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                } else {
                    let _ = write!(out, "\\U{:08x}", c as u32);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Go's `unicode.IsPrint`: letters, marks, numbers, punctuation, symbols
/// and the ASCII space.
fn is_printable(c: char) -> bool {
    use GeneralCategory::*;

    if c == ' ' {
        return true;
    }
    matches!(
        get_general_category(c),
        UppercaseLetter
            | LowercaseLetter
            | TitlecaseLetter
            | ModifierLetter
            | OtherLetter
            | NonspacingMark
            | SpacingMark
            | EnclosingMark
            | DecimalNumber
            | LetterNumber
            | OtherNumber
            | ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
            | MathSymbol
            | CurrencySymbol
            | ModifierSymbol
            | OtherSymbol
    )
}
