//! Protocol error types for command parsing and literal decoding.

use thiserror::Error;

/// Errors raised while turning host arguments into a [`Command`](crate::Command)
/// or while decoding an array literal.
///
/// These are all validation failures: nothing has touched the store yet
/// when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Too few (or an impossible number of) arguments for the command.
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),

    /// An argument that must be an integer isn't one.
    #[error("value is not an integer: '{0}'")]
    InvalidInteger(String),

    /// An argument that must be a number isn't one.
    #[error("value is not a valid float: '{0}'")]
    InvalidFloat(String),

    /// An argument that must be a boolean isn't one.
    #[error("value is not a boolean: '{0}'")]
    InvalidBool(String),

    /// A pop count below 1.
    #[error("count must be at least 1")]
    InvalidCount,

    /// A key argument is empty.
    #[error("empty key for '{0}' command")]
    EmptyKey(String),

    /// The command name isn't recognized.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// An array literal couldn't be decoded.
    #[error("malformed literal: {0}")]
    MalformedLiteral(String),
}
