//! Point-in-time snapshot files.
//!
//! A snapshot holds the full contents of all three keyspaces. The byte
//! stream is gzip-compressed as a whole. Writes go to a `.tmp` file first
//! and are atomically renamed on completion, so a partial or crashed
//! snapshot never corrupts the existing file.
//!
//! Stream layout (before compression):
//! ```text
//! [version: i32]
//! [kv_count: i32]    kv_count   x { key, value }
//! [hash_count: i32]  hash_count x { key, [field_count: i32] field_count x { field, value } }
//! [list_count: i32]  list_count x { key, [item_count: i32] item_count x { item } }
//! ```
//! Every string is `[len: varint][utf-8 bytes]`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::format::{self, FormatError};

/// An owned copy of every keyspace, detached from the live store.
///
/// Hash fields and lists keep the order they were captured in; string
/// and hash key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotData {
    pub strings: Vec<(String, String)>,
    pub hashes: Vec<(String, Vec<(String, String)>)>,
    pub lists: Vec<(String, Vec<String>)>,
}

impl SnapshotData {
    /// Total number of top-level keys across all keyspaces.
    pub fn key_count(&self) -> usize {
        self.strings.len() + self.hashes.len() + self.lists.len()
    }

    /// Returns true if no keyspace holds any key.
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }
}

/// Encodes a snapshot into an uncompressed byte stream.
pub fn encode(w: &mut impl Write, data: &SnapshotData) -> Result<(), FormatError> {
    format::write_header(w)?;

    format::write_count(w, data.strings.len())?;
    for (key, value) in &data.strings {
        format::write_string(w, key)?;
        format::write_string(w, value)?;
    }

    format::write_count(w, data.hashes.len())?;
    for (key, fields) in &data.hashes {
        format::write_string(w, key)?;
        format::write_count(w, fields.len())?;
        for (field, value) in fields {
            format::write_string(w, field)?;
            format::write_string(w, value)?;
        }
    }

    format::write_count(w, data.lists.len())?;
    for (key, items) in &data.lists {
        format::write_string(w, key)?;
        format::write_count(w, items.len())?;
        for item in items {
            format::write_string(w, item)?;
        }
    }

    Ok(())
}

/// Decodes an uncompressed snapshot stream.
///
/// The version is checked first; a mismatch returns
/// [`FormatError::UnsupportedVersion`] without reading the body.
pub fn decode(r: &mut impl Read) -> Result<SnapshotData, FormatError> {
    format::read_header(r)?;

    let kv_count = format::read_count(r, "kv")?;
    let mut strings = Vec::with_capacity(format::capped_capacity(kv_count));
    for _ in 0..kv_count {
        let key = format::read_string(r)?;
        let value = format::read_string(r)?;
        tracing::debug!(%key, value = %preview(&value), "decoded string");
        strings.push((key, value));
    }

    let hash_count = format::read_count(r, "hash")?;
    let mut hashes = Vec::with_capacity(format::capped_capacity(hash_count));
    for _ in 0..hash_count {
        let key = format::read_string(r)?;
        let field_count = format::read_count(r, "hash field")?;
        let mut fields = Vec::with_capacity(format::capped_capacity(field_count));
        for _ in 0..field_count {
            let field = format::read_string(r)?;
            let value = format::read_string(r)?;
            fields.push((field, value));
        }
        tracing::debug!(%key, fields = fields.len(), "decoded hash");
        hashes.push((key, fields));
    }

    let list_count = format::read_count(r, "list")?;
    let mut lists = Vec::with_capacity(format::capped_capacity(list_count));
    for _ in 0..list_count {
        let key = format::read_string(r)?;
        let item_count = format::read_count(r, "list item")?;
        let mut items = Vec::with_capacity(format::capped_capacity(item_count));
        for _ in 0..item_count {
            items.push(format::read_string(r)?);
        }
        tracing::debug!(%key, items = items.len(), "decoded list");
        lists.push((key, items));
    }

    Ok(SnapshotData {
        strings,
        hashes,
        lists,
    })
}

/// First 50 characters of a value, for log lines.
fn preview(value: &str) -> &str {
    match value.char_indices().nth(50) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Serializes a snapshot to gzip-compressed bytes without filesystem I/O.
pub fn write_snapshot_bytes(data: &SnapshotData) -> Result<Vec<u8>, FormatError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encode(&mut encoder, data)?;
    Ok(encoder.finish()?)
}

/// Parses gzip-compressed snapshot bytes.
pub fn read_snapshot_from_bytes(bytes: &[u8]) -> Result<SnapshotData, FormatError> {
    decode(&mut GzDecoder::new(bytes))
}

/// Writes a compressed snapshot to `path`.
///
/// The data lands in `<path>.tmp` first and is renamed over `path` only
/// after it has been fully flushed and synced. Parent directories are
/// created as needed.
pub fn write_snapshot(path: &Path, data: &SnapshotData) -> Result<(), FormatError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path(path);
    let result = write_to(&tmp_path, data).and_then(|()| {
        fs::rename(&tmp_path, path)?;
        Ok(())
    });
    if result.is_err() {
        // drop the incomplete temp file; the original error wins
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_to(path: &Path, data: &SnapshotData) -> Result<(), FormatError> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    encode(&mut encoder, data)?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Reads and decodes a compressed snapshot file.
pub fn read_snapshot(path: &Path) -> Result<SnapshotData, FormatError> {
    let file = File::open(path)?;
    decode(&mut GzDecoder::new(BufReader::new(file)))
}

/// Returns the temporary path used while writing `path`.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
