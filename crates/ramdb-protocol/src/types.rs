//! Reply and literal types.
//!
//! A [`Reply`] is what executing a command produces; [`Reply::to_literal`]
//! renders it in the host's textual form. A [`Literal`] is one decoded
//! element of an array literal coming back from the host.

use crate::serialize::serialize_list;

/// The text returned for a missing key, field, or index.
pub const NOT_FOUND: &str = "NotFound";

/// The text returned for a successful command with nothing else to say.
pub const OK: &str = "OK";

/// The result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain success.
    Ok,

    /// A count, length, or integer result.
    Integer(i64),

    /// A single string value, returned as-is.
    Bulk(String),

    /// The key, field, or index doesn't exist. Distinct from an empty value.
    NotFound,

    /// A list of strings, rendered as an array literal.
    Array(Vec<String>),

    /// A validation or execution failure message.
    Error(String),
}

impl Reply {
    /// Renders the reply in the host's textual form.
    ///
    /// Bulk strings are returned unmodified; arrays become `["a","b"]`
    /// with embedded quotes doubled.
    pub fn to_literal(&self) -> String {
        match self {
            Reply::Ok => OK.to_owned(),
            Reply::Integer(n) => n.to_string(),
            Reply::Bulk(s) => s.clone(),
            Reply::NotFound => NOT_FOUND.to_owned(),
            Reply::Array(items) => serialize_list(items),
            Reply::Error(msg) => msg.clone(),
        }
    }

    /// Returns true for [`Reply::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<Option<String>> for Reply {
    fn from(value: Option<String>) -> Self {
        value.map_or(Reply::NotFound, Reply::Bulk)
    }
}

/// One element of a decoded array literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<Literal>),
}

impl Literal {
    /// The string payload, if this is a string element.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer element.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean element.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
