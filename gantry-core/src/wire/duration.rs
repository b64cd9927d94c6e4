//! `google.protobuf.Duration` JSON form: `"<seconds>[.<fraction>]s"`

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// serde_with adapter for [`Duration`] fields: `#[serde_as(as = "Seconds")]`
pub struct Seconds;

/// Format a duration as whole seconds plus up to nine fractional digits,
/// trailing zeros trimmed: 10 days → `"864000s"`, 100ms → `"0.1s"`.
pub fn format_duration(duration: &Duration) -> String {
    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", secs);
    }
    let fraction = format!("{:09}", nanos);
    format!("{}.{}s", secs, fraction.trim_end_matches('0'))
}

/// Parse the `"<seconds>[.<fraction>]s"` form
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let body = value
        .strip_suffix('s')
        .ok_or_else(|| format!("duration '{}' must end with 's'", value))?;

    let (whole, fraction) = match body.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (body, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("duration '{}' has invalid seconds", value));
    }
    if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("duration '{}' has invalid fractional seconds", value));
    }

    let secs: u64 = whole
        .parse()
        .map_err(|e| format!("duration '{}' out of range: {}", value, e))?;
    let nanos = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<9}", fraction);
        padded
            .parse::<u32>()
            .map_err(|e| format!("duration '{}' has invalid fraction: {}", value, e))?
    };
    debug_assert!(nanos < NANOS_PER_SEC);

    Ok(Duration::new(secs, nanos))
}

impl SerializeAs<Duration> for Seconds {
    fn serialize_as<S: Serializer>(source: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(source))
    }
}

impl<'de> DeserializeAs<'de, Duration> for Seconds {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_str(DurationVisitor)
    }
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a duration string such as \"3.5s\"")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        parse_duration(value).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_days_is_864000s() {
        let ttl = Duration::from_secs(10 * 24 * 60 * 60);
        assert_eq!(format_duration(&ttl), "864000s");
        assert_eq!(parse_duration("864000s").unwrap(), ttl);
    }

    #[test]
    fn fractional_seconds_trim_trailing_zeros() {
        assert_eq!(format_duration(&Duration::from_millis(100)), "0.1s");
        assert_eq!(format_duration(&Duration::from_millis(3500)), "3.5s");
        assert_eq!(format_duration(&Duration::new(1, 1)), "1.000000001s");
    }

    #[test]
    fn zero_is_0s() {
        assert_eq!(format_duration(&Duration::ZERO), "0s");
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parses_fraction_shorter_than_nanos() {
        assert_eq!(parse_duration("0.1s").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("3.5s").unwrap(), Duration::from_millis(3500));
    }

    #[test]
    fn rejects_malformed_values() {
        for bad in ["", "10", "s", "-1s", "1.s0", "1.0000000001s", "abcs", "1e3s"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn round_trips_sub_second_values() {
        for nanos in [1, 10, 999_999_999, 500_000_000, 123_456_789] {
            let duration = Duration::new(42, nanos);
            assert_eq!(parse_duration(&format_duration(&duration)).unwrap(), duration);
        }
    }
}
