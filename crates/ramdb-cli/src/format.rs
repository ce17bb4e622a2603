//! Pretty-printing for replies.
//!
//! Converts command results into colorized, human-readable output in the
//! style familiar to redis-cli users.

use colored::Colorize;
use ramdb_protocol::{ChunkMessage, Reply};

/// Formats a reply for terminal display.
///
/// - `OK`: green
/// - errors: red with `(error)` prefix
/// - integers: yellow with `(integer)` prefix
/// - bulk strings: green, quoted (unless multiline)
/// - not found: dim `(not found)`
/// - arrays: numbered list
pub fn format_reply(reply: &Reply) -> String {
    match reply {
        Reply::Ok => "OK".green().to_string(),

        Reply::Error(e) => format!("{} {}", "(error)".red(), sanitize(e).red()),

        Reply::Integer(n) => format!("{} {}", "(integer)".yellow(), n.to_string().yellow()),

        Reply::Bulk(s) => format_bulk(s),

        Reply::NotFound => "(not found)".dimmed().to_string(),

        Reply::Array(items) if items.is_empty() => "(empty array)".dimmed().to_string(),

        Reply::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}) {}", i + 1, format_bulk(item)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn format_bulk(s: &str) -> String {
    if s.contains('\n') {
        sanitize(s).green().to_string()
    } else {
        format!("\"{}\"", sanitize(s)).green().to_string()
    }
}

/// Formats the chunk pushes emitted for an oversized reply, one per line.
///
/// Messages that don't parse are shown raw.
pub fn format_chunks(messages: &[String]) -> String {
    messages
        .iter()
        .map(|raw| match ChunkMessage::parse(raw) {
            Ok(m) => format!(
                "{} {}",
                format!("(chunk {}/{} {})", m.index, m.total, m.id).cyan(),
                sanitize(&m.data)
            ),
            Err(_) => sanitize(raw),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips ANSI escape sequences and other control characters from
/// stored strings so they can't manipulate the terminal.
/// Retains printable characters, tabs, and newlines (CR/LF).
pub(crate) fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            // skip the ESC and the rest of the ANSI sequence
            if let Some('[') = chars.next() {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else if ch == '\t' || ch == '\n' || ch == '\r' || !ch.is_control() {
            out.push(ch);
        }
    }
    out
}
