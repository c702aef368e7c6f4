//! Monotonic float64 encoding, plus geo-points built on it.

use property_model::GeoPoint;

use crate::errors::DecodeError;
use crate::take;

/// Appends 8 big-endian bytes whose unsigned comparison matches float
/// ordering.
///
/// The IEEE-754 bit pattern is XORed with `-(bits >> 63) | (1 << 63)`: the
/// sign bit is always flipped, and negative values additionally have their
/// remaining bits inverted, which reverses their payload order so that more
/// negative sorts earlier (byte-ordered floats, stereopsis.com/radix.html).
///
/// NaN ordering under this transform is definite and tested: a NaN with the
/// sign bit clear sorts above positive infinity, and a NaN with the sign bit
/// set sorts below negative infinity.
pub fn put_f64(out: &mut Vec<u8>, v: f64) {
    let bits = v.to_bits();
    let bits = bits ^ ((bits >> 63).wrapping_neg() | (1 << 63));
    out.extend_from_slice(&bits.to_be_bytes());
}

/// Reads 8 bytes and applies the inverse transform, advancing `input`.
pub fn take_f64(input: &mut &[u8]) -> Result<f64, DecodeError> {
    let raw = take(input, 8)?;
    // The unwrap is safe: `take` returned exactly 8 bytes.
    let bits = u64::from_be_bytes(raw.try_into().unwrap());
    Ok(f64::from_bits(
        bits ^ ((bits >> 63).wrapping_sub(1) | (1 << 63)),
    ))
}

/// Appends latitude then longitude as two monotonic float64 encodings.
pub fn put_geo_point(out: &mut Vec<u8>, gp: GeoPoint) {
    put_f64(out, gp.lat);
    put_f64(out, gp.lng);
}

/// Reads a geo-point, advancing `input`.
pub fn take_geo_point(input: &mut &[u8]) -> Result<GeoPoint, DecodeError> {
    let lat = take_f64(input)?;
    let lng = take_f64(input)?;
    Ok(GeoPoint { lat, lng })
}
