//! Provider timestamp normalization.
//!
//! The live feed reports `msgtime` with a variable number of fractional
//! digits (none, 1-6, and sometimes 7 or more) followed by a numeric UTC
//! offset. Every timestamp is normalized to microsecond precision, truncating
//! any extra digits, and always carries an explicit offset.

use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, SubsecRound, TimeZone, Utc,
};
use regex::Regex;

use crate::error::{ModelError, ModelResult};

/// Splits a timestamp into `{seconds part, optional fraction, optional offset}`.
static TIMESTAMP_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*T[0-9]{2}:[0-9]{2}:[0-9]{2})(\.[0-9]*)?(Z|[+-][0-9]{2}:?[0-9]{2})?$").unwrap()
});

/// Digits kept after the decimal point.
const FRACTION_DIGITS: usize = 6;

/// Parse a provider `msgtime` into a timezone-aware instant.
///
/// A direct RFC 3339 parse is tried first. When that fails the string is
/// split into its parts, the fraction is padded or truncated to six digits
/// and the result is parsed again. Offset-less input is taken as UTC.
///
/// # Examples
/// ```
/// use bwac_models::timestamp::parse_msgtime;
/// use chrono::Timelike;
///
/// let ts = parse_msgtime("2025-07-24T10:14:51.1234567+00:00").unwrap();
/// assert_eq!(ts.nanosecond(), 123_456_000);
/// ```
pub fn parse_msgtime(raw: &str) -> ModelResult<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.trunc_subsecs(FRACTION_DIGITS as u16));
    }

    let caps = TIMESTAMP_PARTS
        .captures(raw)
        .ok_or_else(|| ModelError::invalid_timestamp(raw))?;

    let seconds = &caps[1];
    let fraction = normalize_fraction(caps.get(2).map(|m| &m.as_str()[1..]));

    match caps.get(3) {
        Some(offset) => {
            let iso = format!("{}.{}{}", seconds, fraction, canonical_offset(offset.as_str()));
            DateTime::parse_from_rfc3339(&iso)
                .map(|ts| ts.trunc_subsecs(FRACTION_DIGITS as u16))
                .map_err(|e| ModelError::invalid_timestamp(format!("{raw}: {e}")))
        }
        None => {
            let iso = format!("{}.{}", seconds, fraction);
            NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
                .map_err(|e| ModelError::invalid_timestamp(format!("{raw}: {e}")))
        }
    }
}

/// Pad or truncate a fraction (without its leading dot) to six digits.
fn normalize_fraction(fraction: Option<&str>) -> String {
    match fraction {
        None => "0".repeat(FRACTION_DIGITS),
        Some(digits) if digits.len() >= FRACTION_DIGITS => digits[..FRACTION_DIGITS].to_string(),
        Some(digits) => format!("{:0<width$}", digits, width = FRACTION_DIGITS),
    }
}

/// `+HHMM` is accepted by the pattern but RFC 3339 wants `+HH:MM`.
fn canonical_offset(offset: &str) -> String {
    if offset.len() == 5 && !offset.contains(':') {
        format!("{}:{}", &offset[..3], &offset[3..])
    } else {
        offset.to_string()
    }
}

/// UTC calendar day of an instant, formatted `YYYY_MM_DD`.
pub fn day_key<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Utc).format("%Y_%m_%d").to_string()
}

/// Format a query bound for the historic API (`YYYY-MM-DDTHH:MM:SS.ffffffZ`).
pub fn format_query_time<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

/// Split `[from, to]` into windows that never cross a UTC day boundary.
///
/// Each full window ends at `23:59:59.999999`; the next one starts one
/// microsecond later. A trailing partial window ends exactly at `to`.
pub fn day_intervals(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals = Vec::new();
    let mut start = from;
    let mut end = end_of_day(start);

    while end <= to {
        intervals.push((start, end));
        start = end + Duration::microseconds(1);
        end = end_of_day(start);
    }

    if end != to && start < to {
        intervals.push((start, to));
    }

    intervals
}

fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = ts.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::days(1) - Duration::microseconds(1)
}
