//! Timestamp encoding.
//!
//! A timestamp is stored as a single sortable uint of
//! `unix_seconds * 1_000_000 + microseconds`: UTC, no timezone offset,
//! truncated (not rounded) to microsecond resolution. This matches the
//! historical at-rest format the encoding is compatible with. Pre-epoch
//! timestamps are outside the encoding's domain; callers hold the invariant
//! that encoded times are at or after the Unix epoch.

use chrono::{DateTime, Utc};

use crate::errors::DecodeError;
use crate::uint::{put_uint, take_uint};

/// Appends the microseconds-since-epoch encoding of `t`.
pub fn put_time(out: &mut Vec<u8>, t: DateTime<Utc>) {
    let micros = t.timestamp() as u64 * 1_000_000 + t.timestamp_subsec_micros() as u64;
    put_uint(out, micros);
}

/// Reads one timestamp, advancing `input`.
pub fn take_time(input: &mut &[u8]) -> Result<DateTime<Utc>, DecodeError> {
    let micros = take_uint(input)?;
    let secs = (micros / 1_000_000) as i64;
    let nanos = ((micros % 1_000_000) * 1_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or(DecodeError::TimestampRange { micros })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn encode(t: DateTime<Utc>) -> Vec<u8> {
        let mut out = Vec::new();
        put_time(&mut out, t);
        out
    }

    #[test]
    fn time_roundtrip_truncates_to_micros() {
        let t = Utc.with_ymd_and_hms(2021, 7, 6, 5, 4, 3).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let buf = encode(t);
        let mut rest = buf.as_slice();
        let decoded = take_time(&mut rest).unwrap();
        assert_eq!(decoded.timestamp(), t.timestamp());
        assert_eq!(decoded.timestamp_subsec_micros(), 123_456);
        assert_eq!(decoded.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn time_encoding_preserves_order() {
        let base = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        let ordered = [
            base,
            base + chrono::Duration::microseconds(1),
            base + chrono::Duration::seconds(1),
            Utc.with_ymd_and_hms(2038, 1, 19, 3, 14, 8).unwrap(),
        ];
        for pair in ordered.windows(2) {
            assert!(encode(pair[0]) < encode(pair[1]));
        }
    }

    #[test]
    fn time_epoch_encodes_as_zero() {
        let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert_eq!(encode(epoch), vec![0]);
    }

    #[test]
    fn time_out_of_range_micros_fail_decode() {
        let mut buf = Vec::new();
        put_uint(&mut buf, u64::MAX);
        let mut rest = buf.as_slice();
        assert_eq!(
            take_time(&mut rest),
            Err(DecodeError::TimestampRange { micros: u64::MAX })
        );
    }
}
