//! Shared value helpers for hourly timestamps and reported quantities

use chrono::{NaiveDateTime, ParseResult, Timelike};

/// Text form used for every persisted timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Drop minutes, seconds and sub-second precision
pub fn truncate_to_hour(at: NaiveDateTime) -> NaiveDateTime {
    at.date()
        .and_hms_opt(at.hour(), 0, 0)
        .unwrap_or(at)
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

/// Round to two decimals, the precision of every stored power value
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_truncate_to_hour() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_milli_opt(14, 37, 12, 500)
            .unwrap();
        assert_eq!(format_timestamp(truncate_to_hour(at)), "2026-10-19 14:00:00");
    }

    #[test]
    fn test_timestamp_text_round_trip() {
        let at = parse_timestamp("2026-01-03 19:00:00").unwrap();
        assert_eq!(at.hour(), 19);
        assert_eq!(format_timestamp(at), "2026-01-03 19:00:00");
        assert!(parse_timestamp("2026-01-03T19:00:00").is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(123.456), 123.46);
        assert_eq!(round2(-0.004), -0.0);
        assert_eq!(round2(150.0), 150.0);
    }
}
