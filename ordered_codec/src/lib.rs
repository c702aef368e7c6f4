//! Ordered Codec - order-preserving encodings for primitive property values
//!
//! Every encoder appends to a `Vec<u8>` such that unsigned lexicographic
//! comparison of the encoded bytes equals the natural comparison of the
//! decoded values, which makes the output directly usable as a sort key in a
//! key-value store. Decoders consume from the front of a `&[u8]` slice,
//! advancing it past what they read.
//!
//! Encoding is infallible for valid in-memory input; decoding reports
//! truncated buffers and oversized length prefixes through [`DecodeError`].

pub mod blob;
pub mod errors;
pub mod float;
pub mod time;
pub mod uint;

pub use blob::{put_bytes, put_str, take_bytes, take_str, MAX_DECODE_LEN};
pub use errors::DecodeError;
pub use float::{put_f64, put_geo_point, take_f64, take_geo_point};
pub use time::{put_time, take_time};
pub use uint::{put_uint, take_uint};

/// Splits `n` bytes off the front of `input`, or reports how short it is.
pub(crate) fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if input.len() < n {
        return Err(DecodeError::Truncated {
            needed: n,
            remaining: input.len(),
        });
    }
    let (head, rest) = input.split_at(n);
    *input = rest;
    Ok(head)
}
