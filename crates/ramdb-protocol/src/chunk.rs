//! Chunked delivery of oversized responses.
//!
//! The host reads each response from a fixed-size output buffer. When a
//! payload doesn't fit, [`ChunkedResponder::deliver`] splits it and
//! pushes every piece through a one-way [`ChunkSink`], returning `"OK"`
//! in place of the data. Each push carries a [`ChunkMessage`] literal:
//!
//! ```text
//! ["<id>", "<function>", <index>, <total>, "<chunk>", <push>, "<entity>"]
//! ```
//!
//! `index` is 1-based and the chunk text has its quotes doubled. A
//! receiver collects `total` messages for an id and concatenates the
//! chunk texts in index order to rebuild the payload.

use tracing::debug;

use crate::error::ProtocolError;
use crate::parse::parse_array;
use crate::serialize::{is_array_literal, quote};
use crate::types::{Literal, OK};

/// Channel name used for chunk pushes unless overridden.
pub const DEFAULT_CHANNEL: &str = "ramdb";

/// Topic (the host-side handler) used for chunk pushes unless overridden.
pub const DEFAULT_TOPIC: &str = "ramdb_db_fnc_fetch";

/// One-way delivery of chunk notifications to the host.
pub trait ChunkSink {
    fn push(&self, channel: &str, topic: &str, message: &str);
}

impl<F> ChunkSink for F
where
    F: Fn(&str, &str, &str),
{
    fn push(&self, channel: &str, topic: &str, message: &str) {
        self(channel, topic, message)
    }
}

/// How an oversized payload is cut into pieces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitMode {
    /// Pieces of at most `budget` characters. A piece with multi-byte
    /// characters can exceed `budget` bytes.
    #[default]
    Chars,
    /// Pieces of at most `budget` bytes, never splitting a character.
    /// A single character wider than the budget still gets its own piece.
    Bytes,
}

/// Host-side routing carried along with every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryTarget {
    /// Host function that should receive the reassembled payload.
    pub function: String,
    /// Host entity the function runs against.
    pub entity: String,
    /// Whether the host should push the result on to the entity.
    pub push: bool,
}

/// A single chunk notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMessage {
    pub id: String,
    pub function: String,
    /// 1-based position of this chunk.
    pub index: usize,
    pub total: usize,
    /// The chunk text, unescaped.
    pub data: String,
    pub push: bool,
    pub entity: String,
}

impl ChunkMessage {
    /// Renders the message as the literal pushed to the host.
    pub fn to_literal(&self) -> String {
        format!(
            "[{}, {}, {}, {}, {}, {}, {}]",
            quote(&self.id),
            quote(&self.function),
            self.index,
            self.total,
            quote(&self.data),
            self.push,
            quote(&self.entity),
        )
    }

    /// Decodes a pushed literal back into a message.
    pub fn parse(literal: &str) -> Result<Self, ProtocolError> {
        let items = parse_array(literal)?;
        let [id, function, index, total, data, push, entity] = items.as_slice() else {
            return Err(ProtocolError::MalformedLiteral(format!(
                "chunk message needs 7 elements, got {}",
                items.len()
            )));
        };

        let string = |lit: &Literal, name: &str| {
            lit.as_str()
                .map(str::to_owned)
                .ok_or_else(|| ProtocolError::MalformedLiteral(format!("{name} must be a string")))
        };
        let position = |lit: &Literal, name: &str| {
            lit.as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|&n| n >= 1)
                .ok_or_else(|| {
                    ProtocolError::MalformedLiteral(format!("{name} must be a positive integer"))
                })
        };

        let msg = ChunkMessage {
            id: string(id, "id")?,
            function: string(function, "function")?,
            index: position(index, "index")?,
            total: position(total, "total")?,
            data: string(data, "data")?,
            push: push
                .as_bool()
                .ok_or_else(|| ProtocolError::MalformedLiteral("push must be a boolean".into()))?,
            entity: string(entity, "entity")?,
        };
        if msg.index > msg.total {
            return Err(ProtocolError::MalformedLiteral(format!(
                "chunk index {} exceeds total {}",
                msg.index, msg.total
            )));
        }
        Ok(msg)
    }
}

/// Rebuilds a payload from its chunk messages.
///
/// The messages may arrive in any order. Returns `None` unless exactly
/// one message is present for every index from 1 to `total`.
pub fn reassemble(messages: &[ChunkMessage]) -> Option<String> {
    let total = messages.first()?.total;
    if messages.len() != total || messages.iter().any(|m| m.total != total) {
        return None;
    }
    let mut ordered: Vec<&ChunkMessage> = messages.iter().collect();
    ordered.sort_by_key(|m| m.index);
    if ordered.iter().enumerate().any(|(i, m)| m.index != i + 1) {
        return None;
    }
    Some(ordered.iter().map(|m| m.data.as_str()).collect())
}

/// Wraps `payload` as an array literal unless it already is one.
pub fn normalize_payload(payload: &str) -> String {
    if is_array_literal(payload) {
        payload.to_owned()
    } else {
        format!("[{payload}]")
    }
}

/// Splits `text` into contiguous pieces according to `mode`.
///
/// Concatenating the pieces always yields `text` again. A zero budget
/// is treated as 1.
pub fn split_chunks(text: &str, budget: usize, mode: SplitMode) -> Vec<&str> {
    let budget = budget.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, ch) in text.char_indices() {
        let full = match mode {
            SplitMode::Chars => count == budget,
            SplitMode::Bytes => offset > start && offset + ch.len_utf8() - start > budget,
        };
        if full {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Delivers responses, falling back to chunk pushes when they're too large.
#[derive(Debug)]
pub struct ChunkedResponder<S> {
    sink: S,
    channel: String,
    topic: String,
    mode: SplitMode,
}

impl<S: ChunkSink> ChunkedResponder<S> {
    /// Creates a responder pushing to the default channel and topic.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            channel: DEFAULT_CHANNEL.to_owned(),
            topic: DEFAULT_TOPIC.to_owned(),
            mode: SplitMode::default(),
        }
    }

    /// Overrides the channel and topic passed to the sink.
    pub fn with_route(mut self, channel: impl Into<String>, topic: impl Into<String>) -> Self {
        self.channel = channel.into();
        self.topic = topic.into();
        self
    }

    /// Selects how oversized payloads are split.
    pub fn with_split_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    /// The sink receiving chunk pushes.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns `payload` unchanged if it fits in `budget` bytes.
    ///
    /// Otherwise the payload is normalized to an array literal, split,
    /// pushed as numbered chunk messages tagged with `id`, and `"OK"` is
    /// returned instead.
    pub fn deliver(&self, id: &str, budget: usize, payload: &str, target: &DeliveryTarget) -> String {
        if payload.len() <= budget {
            return payload.to_owned();
        }

        let text = normalize_payload(payload);
        let chunks = split_chunks(&text, budget, self.mode);
        let total = chunks.len();
        debug!(id, bytes = payload.len(), budget, total, "delivering response in chunks");

        for (i, chunk) in chunks.into_iter().enumerate() {
            let message = ChunkMessage {
                id: id.to_owned(),
                function: target.function.clone(),
                index: i + 1,
                total,
                data: chunk.to_owned(),
                push: target.push,
                entity: target.entity.clone(),
            }
            .to_literal();
            debug!(id, index = i + 1, "chunk: {message}");
            self.sink.push(&self.channel, &self.topic, &message);
        }
        OK.to_owned()
    }
}
