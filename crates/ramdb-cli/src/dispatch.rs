//! Command dispatch: runs parsed commands against an engine.
//!
//! [`execute`] maps each [`Command`] onto the store and produces a
//! [`Reply`]. A [`Session`] wraps that with the host output contract:
//! the reply is rendered to its literal form and handed to a
//! [`ChunkedResponder`], so anything larger than the configured buffer
//! goes out as chunk pushes instead of a direct return value.

use std::cell::{Cell, RefCell};

use ramdb_core::{Engine, InsertPosition};
use ramdb_protocol::{
    ChunkSink, ChunkedResponder, Command, DeliveryTarget, InsertSide, ProtocolError, Reply,
    SplitMode,
};
use tracing::debug;

/// Executes a single command against `engine`.
///
/// Never fails: missing data is [`Reply::NotFound`], and persistence
/// failures come back as [`Reply::Error`].
pub fn execute(engine: &Engine, cmd: &Command) -> Reply {
    let store = engine.store();
    match cmd {
        Command::Set { key, value } => {
            store.strings().set(key, value.as_str());
            Reply::Ok
        }
        Command::Get { key } => store.strings().get(key).into(),
        Command::Del { keys } => Reply::Integer(store.del(keys) as i64),
        Command::Exists { keys } => Reply::Integer(store.exists(keys) as i64),
        Command::IncrBy { key, delta } => Reply::Integer(store.strings().incr_by(key, *delta)),
        Command::IncrByFloat { key, delta } => {
            Reply::Bulk(store.strings().incr_by_float(key, *delta))
        }

        Command::HSet { key, field, value } => {
            store.hashes().hset(key, field, value);
            Reply::Ok
        }
        Command::HMSet { key, pairs } => {
            store.hashes().hmset(key, pairs);
            Reply::Ok
        }
        Command::HGet { key, field, .. } => store.hashes().hget(key, field).into(),
        Command::HGetAll { key, .. } => Reply::Array(
            store
                .hashes()
                .hgetall(key)
                .into_iter()
                .flat_map(|(f, v)| [f, v])
                .collect(),
        ),
        Command::HDel { key, fields } => Reply::Integer(store.hashes().hdel(key, fields) as i64),
        Command::HLen { key } => Reply::Integer(store.hashes().hlen(key) as i64),
        Command::HKeys { key, .. } => Reply::Array(store.hashes().hkeys(key)),
        Command::HVals { key, .. } => Reply::Array(store.hashes().hvals(key)),
        Command::HExists { key, field } => {
            Reply::Integer(i64::from(store.hashes().hexists(key, field)))
        }
        Command::HIncrBy { key, field, delta } => {
            Reply::Integer(store.hashes().hincrby(key, field, *delta))
        }
        Command::HIncrByFloat { key, field, delta } => {
            Reply::Bulk(store.hashes().hincrbyfloat(key, field, *delta))
        }

        Command::LPush { key, values } => Reply::Integer(store.lists().lpush(key, values) as i64),
        Command::RPush { key, values } => Reply::Integer(store.lists().rpush(key, values) as i64),
        Command::LPop { key, count } => store
            .lists()
            .lpop(key, *count)
            .map_or(Reply::NotFound, Reply::Array),
        Command::RPop { key, count } => store
            .lists()
            .rpop(key, *count)
            .map_or(Reply::NotFound, Reply::Array),
        Command::LRange { key, start, end } => {
            Reply::Array(store.lists().lrange(key, *start, *end))
        }
        Command::LIndex { key, index, .. } => store.lists().lindex(key, *index).into(),
        Command::LLen { key } => Reply::Integer(store.lists().llen(key) as i64),
        Command::LInsert {
            key,
            side,
            pivot,
            value,
        } => {
            let position = match side {
                InsertSide::Before => InsertPosition::Before,
                InsertSide::After => InsertPosition::After,
            };
            Reply::Integer(store.lists().linsert(key, position, pivot, value))
        }
        Command::LSet { key, index, value } => ok_or_not_found(store.lists().lset(key, *index, value)),
        Command::LRem { key, count, value } => {
            Reply::Integer(store.lists().lrem(key, *count, value) as i64)
        }
        Command::LTrim { key, start, end } => {
            ok_or_not_found(store.lists().ltrim(key, *start, *end))
        }

        Command::Save { backup } => {
            if engine.persistence().save(*backup) {
                Reply::Ok
            } else {
                Reply::Error("error saving to disk".into())
            }
        }
        Command::Load { path } => {
            let persistence = engine.persistence();
            let loaded = match path {
                Some(path) => persistence.load(path),
                None => persistence.load_primary(),
            };
            if loaded {
                Reply::Ok
            } else {
                Reply::Error("error loading from disk".into())
            }
        }
        Command::Backups => Reply::Array(engine.persistence().list_backups()),
        Command::Version => Reply::Bulk(env!("CARGO_PKG_VERSION").to_owned()),
    }
}

fn ok_or_not_found(found: bool) -> Reply {
    if found {
        Reply::Ok
    } else {
        Reply::NotFound
    }
}

/// Collects chunk pushes so the caller can display them.
#[derive(Debug, Default)]
pub struct ChunkCollector {
    messages: RefCell<Vec<String>>,
}

impl ChunkCollector {
    /// Removes and returns everything pushed so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }
}

impl ChunkSink for ChunkCollector {
    fn push(&self, _channel: &str, _topic: &str, message: &str) {
        self.messages.borrow_mut().push(message.to_owned());
    }
}

/// The outcome of one host call.
#[derive(Debug)]
pub struct Outcome {
    /// The command that ran.
    pub command: Command,
    /// The full result.
    pub reply: Reply,
    /// What the host receives as the direct return value. This is `"OK"`
    /// rather than the reply when the reply was delivered in chunks.
    pub output: String,
    /// Whether the reply went out as chunk pushes.
    pub chunked: bool,
}

/// An engine plus the output contract used to answer host calls.
#[derive(Debug)]
pub struct Session<S> {
    engine: Engine,
    responder: ChunkedResponder<S>,
    buffer_size: usize,
    next_id: Cell<u64>,
}

impl<S: ChunkSink> Session<S> {
    /// Creates a session whose output budget comes from the engine config.
    pub fn new(engine: Engine, sink: S) -> Self {
        let buffer_size = engine.config().buffer_size;
        Self {
            engine,
            responder: ChunkedResponder::new(sink),
            buffer_size,
            next_id: Cell::new(1),
        }
    }

    /// Selects how oversized replies are split.
    pub fn with_split_mode(mut self, mode: SplitMode) -> Self {
        self.responder = self.responder.with_split_mode(mode);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// The sink receiving chunk pushes.
    pub fn sink(&self) -> &S {
        self.responder.sink()
    }

    /// Parses and runs one host call.
    pub fn call<A: AsRef<str>>(&self, name: &str, args: &[A]) -> Result<Outcome, ProtocolError> {
        let command = Command::from_args(name, args)?;
        debug!(command = command.name(), "executing");
        let reply = execute(&self.engine, &command);

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let request_id = format!("{id}_{}", command.name().to_ascii_lowercase());

        let literal = reply.to_literal();
        let default_target = DeliveryTarget::default();
        let target = command.delivery().unwrap_or(&default_target);
        let output = self
            .responder
            .deliver(&request_id, self.buffer_size, &literal, target);
        let chunked = literal.len() > self.buffer_size;

        Ok(Outcome {
            command,
            reply,
            output,
            chunked,
        })
    }
}
