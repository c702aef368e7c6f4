//! Sortable unsigned varint. Lexicographic order == numeric order.
//!
//! Layout (the sqlite4 key-encoding varint): values through 240 are a single
//! byte; 241..=2287 and 2288..=67823 use short two/three byte forms; larger
//! values are a length-describing first byte (250..=255) followed by the
//! minimal big-endian representation. The first byte grows with the value,
//! and within one length class the big-endian tail compares naturally, so
//! byte-wise comparison matches numeric comparison.

use crate::errors::DecodeError;
use crate::take;

/// Appends the order-preserving encoding of `v` to `out`.
pub fn put_uint(out: &mut Vec<u8>, v: u64) {
    if v <= 240 {
        out.push(v as u8);
    } else if v <= 2287 {
        let v = v - 240;
        out.push((v / 256) as u8 + 241);
        out.push((v % 256) as u8);
    } else if v <= 67823 {
        let v = v - 2288;
        out.push(249);
        out.push((v / 256) as u8);
        out.push((v % 256) as u8);
    } else {
        let be = v.to_be_bytes();
        let len = 8 - (v.leading_zeros() / 8) as usize;
        out.push(247 + len as u8);
        out.extend_from_slice(&be[8 - len..]);
    }
}

/// Reads one varint from the front of `input`, advancing it.
pub fn take_uint(input: &mut &[u8]) -> Result<u64, DecodeError> {
    let a0 = take(input, 1)?[0];
    match a0 {
        0..=240 => Ok(a0 as u64),
        241..=248 => {
            let a1 = take(input, 1)?[0];
            Ok(240 + 256 * (a0 as u64 - 241) + a1 as u64)
        }
        249 => {
            let tail = take(input, 2)?;
            Ok(2288 + 256 * tail[0] as u64 + tail[1] as u64)
        }
        250..=255 => {
            let len = a0 as usize - 247;
            let tail = take(input, len)?;
            let mut v = 0u64;
            for &b in tail {
                v = v << 8 | b as u64;
            }
            Ok(v)
        }
    }
}
