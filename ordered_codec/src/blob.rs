//! Length-prefixed strings and byte sequences.

use crate::errors::DecodeError;
use crate::uint::{put_uint, take_uint};
use crate::take;

/// Decoders refuse length prefixes above this ceiling instead of allocating
/// unbounded memory for malformed or adversarial input.
pub const MAX_DECODE_LEN: usize = 2 * 1024 * 1024;

/// Appends `uint(len) || raw bytes`.
pub fn put_bytes(out: &mut Vec<u8>, b: &[u8]) {
    put_uint(out, b.len() as u64);
    out.extend_from_slice(b);
}

/// Reads one length-prefixed byte sequence, advancing `input`.
pub fn take_bytes(input: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = take_uint(input)?;
    if len > MAX_DECODE_LEN as u64 {
        return Err(DecodeError::OversizedLength {
            length: len,
            max: MAX_DECODE_LEN,
        });
    }
    Ok(take(input, len as usize)?.to_vec())
}

/// Appends a string as `uint(len) || UTF-8 bytes`.
pub fn put_str(out: &mut Vec<u8>, s: &str) {
    put_bytes(out, s.as_bytes());
}

/// Reads one length-prefixed string, advancing `input`.
pub fn take_str(input: &mut &[u8]) -> Result<String, DecodeError> {
    Ok(String::from_utf8(take_bytes(input)?)?)
}
