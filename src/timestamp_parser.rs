use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Naive layouts accepted when a timestamp carries no offset.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Handles parsing the `T` field of query log entries
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a timestamp string, keeping the offset it was written with.
    /// Offset-less timestamps are taken as UTC.
    pub fn parse(timestamp_str: &str) -> Result<DateTime<FixedOffset>> {
        let timestamp = timestamp_str.trim();

        // RFC 3339 covers both the Z suffix and numeric offsets, at any
        // fractional precision AdGuard Home writes (up to nanoseconds)
        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
            return Ok(dt);
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, format) {
                return Ok(naive.and_utc().fixed_offset());
            }
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_z_suffix() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000Z");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_keeps_local_wall_clock() {
        let dt = TimestampParser::parse("2024-05-01T23:30:00.123456789+02:00").unwrap();
        assert_eq!(dt.naive_local().hour(), 23);
        assert_eq!(dt.naive_local().day(), 1);
        assert_eq!(dt.naive_utc().hour(), 21);
    }

    #[test]
    fn test_parse_naive() {
        let dt = TimestampParser::parse("2024-01-01T12:00:00.000").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);
        assert!(TimestampParser::parse("2024-01-01 12:00:00").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TimestampParser::parse("invalid").is_err());
        assert!(TimestampParser::parse("bad").is_err());
        assert!(TimestampParser::parse("").is_err());
    }
}
