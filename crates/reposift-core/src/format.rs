//! Display formatting for search results.

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;

use crate::error::{Error, InvalidInputError};

/// Joins a number and its unit so rendered sizes never wrap.
const NBSP: char = '\u{a0}';

const KB: u64 = 1 << 10;
const MB: u64 = 1 << 20;
const GB: u64 = 1 << 30;
const TB: u64 = 1 << 40;
const PB: u64 = 1 << 50;

/// Format a byte count in binary units with one decimal place.
///
/// Below 1 KB the exact count is printed (`"1 byte"`, `"512 bytes"`).
/// Larger values use the biggest unit up to PB, rounded half-up.
///
/// ```
/// use reposift_core::format::format_size;
///
/// assert_eq!(format_size(1_048_576), "1.0\u{a0}MB");
/// assert_eq!(format_size(1), "1\u{a0}byte");
/// ```
pub fn format_size(bytes: u64) -> String {
    let (unit, suffix) = match bytes {
        0..KB => {
            let noun = if bytes == 1 { "byte" } else { "bytes" };
            return format!("{}{}{}", bytes, NBSP, noun);
        }
        KB..MB => (KB, "KB"),
        MB..GB => (MB, "MB"),
        GB..TB => (GB, "GB"),
        TB..PB => (TB, "TB"),
        _ => (PB, "PB"),
    };

    let unit = u128::from(unit);
    let tenths = (u128::from(bytes) * 10 + unit / 2) / unit;
    format!("{}.{}{}{}", tenths / 10, tenths % 10, NBSP, suffix)
}

/// Format a modification time as an RFC 3339 timestamp in `tz`.
///
/// Values outside the 32-bit range are storage timestamps in microseconds
/// and are scaled down to seconds first. Instants chrono cannot represent
/// render as an empty string.
///
/// ```
/// use reposift_core::format::format_timestamp;
///
/// assert_eq!(format_timestamp(0, &chrono_tz::UTC), "1970-01-01T00:00:00+00:00");
/// ```
pub fn format_timestamp(ts: i64, tz: &Tz) -> String {
    let secs = if (i64::from(i32::MIN)..=i64::from(i32::MAX)).contains(&ts) {
        ts
    } else {
        ts.div_euclid(1_000_000)
    };

    DateTime::from_timestamp(secs, 0)
        .map(|dt| {
            dt.with_timezone(tz)
                .to_rfc3339_opts(SecondsFormat::Secs, false)
        })
        .unwrap_or_default()
}

/// Parse an IANA time zone name such as `"Europe/Berlin"`.
pub fn parse_time_zone(name: &str) -> Result<Tz, Error> {
    name.parse::<Tz>().map_err(|e| {
        InvalidInputError::TimeZone {
            value: name.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
