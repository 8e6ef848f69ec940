//! Timestamp resolution helpers.
//!
//! Block timestamps are microseconds on the node, transaction timestamps may be
//! anything the wallet chose, and callers think in epoch seconds. The
//! resolution is inferred from the number of decimal digits: a 10-digit value
//! is seconds, 13 digits milliseconds, 16 digits microseconds.

use chrono::{DateTime, Utc};

/// Number of decimal digits of an epoch-seconds value in the current era.
const SECONDS_DIGITS: u32 = 10;

fn decimal_digits(value: u64) -> u32 {
    value.checked_ilog10().map_or(1, |d| d + 1)
}

/// Number of native units per second for a timestamp of unknown resolution.
///
/// `1` for epoch seconds, `1_000` for milliseconds, `1_000_000` for
/// microseconds.
pub fn timestamp_scale(timestamp: i64) -> i64 {
    let digits = decimal_digits(timestamp.unsigned_abs());
    if digits <= SECONDS_DIGITS {
        return 1;
    }
    10i64.pow(digits - SECONDS_DIGITS)
}

/// Reduce a timestamp of unknown resolution to epoch seconds.
///
/// Values with more than ten digits are divided by the matching power of ten;
/// shorter values are already seconds and pass through unchanged.
pub fn normalize_epoch_seconds(timestamp: i64) -> i64 {
    timestamp / timestamp_scale(timestamp)
}

/// Render epoch seconds as an ISO-8601 UTC string with second precision.
///
/// Returns `None` when the value is outside the representable date range.
pub fn epoch_seconds_to_rfc3339(seconds: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}
