//! Binary encoding primitives for snapshot files.
//!
//! Integers are stored as little-endian `i32`. Strings are UTF-8 with a
//! 7-bit variable-length prefix: each byte carries seven bits of the
//! length, low group first, and the high bit marks a continuation. This
//! is the same convention the .NET `BinaryWriter` uses, so snapshots are
//! interchangeable with files written by that family of tools.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Current snapshot format version. Files with any other leading
/// version integer are rejected without reading further.
pub const FORMAT_VERSION: i32 = 1;

/// Errors that can occur when reading or writing the snapshot format.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(i32),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// write helpers
// ---------------------------------------------------------------------------

/// Writes an `i32` in little-endian.
pub fn write_i32(w: &mut impl Write, val: i32) -> io::Result<()> {
    w.write_all(&val.to_le_bytes())
}

/// Writes a collection count as `i32`.
///
/// Counts above [`MAX_COLLECTION_COUNT`] are refused so that every
/// snapshot written can also be read back.
pub fn write_count(w: &mut impl Write, len: usize) -> io::Result<()> {
    let len = i32::try_from(len)
        .ok()
        .filter(|&n| n as u32 <= MAX_COLLECTION_COUNT)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("collection length {len} exceeds max {MAX_COLLECTION_COUNT}"),
            )
        })?;
    write_i32(w, len)
}

/// Writes a 7-bit variable-length unsigned integer.
fn write_varint(w: &mut impl Write, mut val: u32) -> io::Result<()> {
    let mut buf = [0u8; 5];
    let mut n = 0;
    while val >= 0x80 {
        buf[n] = (val as u8) | 0x80;
        val >>= 7;
        n += 1;
    }
    buf[n] = val as u8;
    w.write_all(&buf[..=n])
}

/// Writes a length-prefixed UTF-8 string: `[len: varint][bytes]`.
pub fn write_string(w: &mut impl Write, s: &str) -> io::Result<()> {
    let len = u32::try_from(s.len())
        .ok()
        .filter(|&len| len <= i32::MAX as u32)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("string length {} exceeds i32::MAX", s.len()),
            )
        })?;
    write_varint(w, len)?;
    w.write_all(s.as_bytes())
}

// ---------------------------------------------------------------------------
// read helpers
// ---------------------------------------------------------------------------

/// Reads an `i32` in little-endian.
pub fn read_i32(r: &mut impl Read) -> Result<i32, FormatError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Reads a collection count, rejecting negative values and counts above
/// [`MAX_COLLECTION_COUNT`].
pub fn read_count(r: &mut impl Read, label: &str) -> Result<usize, FormatError> {
    let count = read_i32(r)?;
    if count < 0 {
        return Err(FormatError::InvalidData(format!(
            "{label} count is negative ({count})"
        )));
    }
    validate_collection_count(count as u32, label)?;
    Ok(count as usize)
}

/// Reads a 7-bit variable-length unsigned integer (at most five bytes).
fn read_varint(r: &mut impl Read) -> Result<u32, FormatError> {
    let mut result: u32 = 0;
    for i in 0..5 {
        let mut byte = [0u8; 1];
        read_exact(r, &mut byte)?;
        let b = byte[0];
        result |= u32::from(b & 0x7F) << (7 * i);
        if b & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(FormatError::InvalidData("string length prefix is too long".into()))
}

/// Maximum length we'll allocate when reading a length-prefixed field.
/// A corrupt prefix won't cause a multi-gigabyte allocation.
pub const MAX_FIELD_LEN: usize = 512 * 1024 * 1024;

/// Reads a length-prefixed UTF-8 string.
///
/// Returns an error if the declared length exceeds [`MAX_FIELD_LEN`] or
/// the bytes are not valid UTF-8.
pub fn read_string(r: &mut impl Read) -> Result<String, FormatError> {
    let len = read_varint(r)? as usize;
    if len > MAX_FIELD_LEN {
        return Err(FormatError::InvalidData(format!(
            "field length {len} exceeds maximum of {MAX_FIELD_LEN}"
        )));
    }
    let mut buf = vec![0u8; len];
    read_exact(r, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|_| FormatError::InvalidData("string is not valid utf-8".into()))
}

/// Reads exactly `buf.len()` bytes, returning `UnexpectedEof` on short read.
fn read_exact(r: &mut impl Read, buf: &mut [u8]) -> Result<(), FormatError> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::UnexpectedEof
        } else {
            FormatError::Io(e)
        }
    })
}

/// Writes the leading format version.
pub fn write_header(w: &mut impl Write) -> io::Result<()> {
    write_i32(w, FORMAT_VERSION)
}

/// Reads the leading format version and rejects anything but
/// [`FORMAT_VERSION`].
pub fn read_header(r: &mut impl Read) -> Result<(), FormatError> {
    let version = read_i32(r)?;
    if version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    Ok(())
}

/// Caps pre-allocation to avoid huge allocations from corrupt count fields.
pub fn capped_capacity(count: usize) -> usize {
    count.min(65_536)
}

/// Maximum element count for a single collection in a snapshot.
pub const MAX_COLLECTION_COUNT: u32 = 100_000_000;

/// Validates that a deserialized collection count is within bounds.
pub fn validate_collection_count(count: u32, label: &str) -> Result<(), FormatError> {
    if count > MAX_COLLECTION_COUNT {
        return Err(FormatError::InvalidData(format!(
            "{label} count {count} exceeds max {MAX_COLLECTION_COUNT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn i32_is_little_endian() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 1).unwrap();
        assert_eq!(buf, vec![1, 0, 0, 0]);
        assert_eq!(read_i32(&mut Cursor::new(&buf)).unwrap(), 1);
    }

    #[test]
    fn short_string_has_one_byte_prefix() {
        let mut buf = Vec::new();
        write_string(&mut buf, "abc").unwrap();
        assert_eq!(buf, vec![3, b'a', b'b', b'c']);
    }

    #[test]
    fn long_string_prefix_uses_continuation_bits() {
        let s = "x".repeat(300);
        let mut buf = Vec::new();
        write_string(&mut buf, &s).unwrap();
        // 300 = 0b10_0101100 -> 0xAC, 0x02
        assert_eq!(&buf[..2], &[0xAC, 0x02]);
        assert_eq!(read_string(&mut Cursor::new(&buf)).unwrap(), s);
    }

    #[test]
    fn multibyte_string_length_counts_bytes() {
        let mut buf = Vec::new();
        write_string(&mut buf, "héllo").unwrap();
        assert_eq!(buf[0], 6);
        assert_eq!(read_string(&mut Cursor::new(&buf)).unwrap(), "héllo");
    }

    #[test]
    fn empty_string() {
        let mut buf = Vec::new();
        write_string(&mut buf, "").unwrap();
        assert_eq!(buf, vec![0]);
        assert_eq!(read_string(&mut Cursor::new(&buf)).unwrap(), "");
    }

    #[test]
    fn header_wrong_version() {
        let mut buf = Vec::new();
        write_i32(&mut buf, 99).unwrap();
        let err = read_header(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(99)));
    }

    #[test]
    fn negative_count_rejected() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -5).unwrap();
        let err = read_count(&mut Cursor::new(&buf), "kv").unwrap_err();
        assert!(matches!(err, FormatError::InvalidData(_)));
    }

    #[test]
    fn write_count_enforces_read_limit() {
        let mut buf = Vec::new();
        let max = MAX_COLLECTION_COUNT as usize;
        write_count(&mut buf, max).unwrap();
        assert_eq!(read_count(&mut Cursor::new(&buf), "list").unwrap(), max);

        let err = write_count(&mut Vec::new(), max + 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(write_count(&mut Vec::new(), usize::MAX).is_err());
    }

    #[test]
    fn truncated_input_returns_eof() {
        let buf = [0u8; 2];
        let err = read_i32(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedEof));
    }

    #[test]
    fn truncated_string_body_returns_eof() {
        let buf = [5u8, b'a', b'b'];
        let err = read_string(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedEof));
    }

    #[test]
    fn overlong_prefix_rejected() {
        let buf = [0xFFu8; 6];
        let err = read_string(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, FormatError::InvalidData(_)));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let buf = [2u8, 0xC3, 0x28];
        let err = read_string(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, FormatError::InvalidData(_)));
    }
}
