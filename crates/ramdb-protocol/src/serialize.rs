//! Host array-literal serialization.
//!
//! The host understands array literals of the form `["a","b"]`. String
//! elements are wrapped in double quotes, and a quote inside a string is
//! written twice (`"` becomes `""`), which is the host's only escape.

/// Appends `s` to `out` as a quoted string element.
pub fn write_quoted(out: &mut String, s: &str) {
    out.reserve(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Returns `s` as a quoted string element.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_quoted(&mut out, s);
    out
}

/// Serializes a list of strings as an array literal.
pub fn serialize_list<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::with_capacity(2 + items.iter().map(|s| s.as_ref().len() + 3).sum::<usize>());
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_quoted(&mut out, item.as_ref());
    }
    out.push(']');
    out
}

/// Returns true if `text` already looks like an array literal.
pub fn is_array_literal(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}
