//! ramdb-protocol: the host-facing command surface.
//!
//! Turns host function calls into typed [`Command`]s, renders results as
//! [`Reply`] literals, and delivers responses that don't fit the host's
//! output buffer as a series of chunk pushes.
//!
//! # quick start
//!
//! ```
//! use ramdb_protocol::{Command, Reply};
//!
//! let cmd = Command::from_args("lrange", &["queue", "0", "-1"]).unwrap();
//! assert_eq!(cmd.name(), "LRANGE");
//!
//! let reply = Reply::Array(vec!["a".into(), "b".into()]);
//! assert_eq!(reply.to_literal(), r#"["a","b"]"#);
//! ```

pub mod chunk;
pub mod command;
pub mod error;
pub mod parse;
pub mod serialize;
pub mod types;

pub use chunk::{ChunkMessage, ChunkSink, ChunkedResponder, DeliveryTarget, SplitMode};
pub use command::{Command, InsertSide, COMMAND_NAMES};
pub use error::ProtocolError;
pub use parse::parse_array;
pub use serialize::serialize_list;
pub use types::{Literal, Reply};
