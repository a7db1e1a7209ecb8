//! Timestamp parsing for remote records

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a timestamp in the formats backends commonly send.
///
/// Values without an offset are taken as UTC. Numbers are Unix epoch
/// seconds, or milliseconds when they are too large to be seconds.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp_str(s),
        serde_json::Value::Number(n) => {
            let n = n.as_i64()?;
            if n.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(n)
            } else {
                DateTime::from_timestamp(n, 0)
            }
        }
        _ => None,
    }
}

/// Parse a timestamp string
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let with_offset = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%z"];
    for fmt in with_offset {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    for fmt in naive {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_only() {
        assert_eq!(
            parse_timestamp_str("2024-06-01"),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp_str("2025-11-18T17:30:00+05:30"),
            Some(Utc.with_ymd_and_hms(2025, 11, 18, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_sql_datetime() {
        assert_eq!(
            parse_timestamp_str("2024-01-15 10:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_epoch_numbers() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&serde_json::json!(1704067200)), Some(expected));
        assert_eq!(parse_timestamp(&serde_json::json!(1704067200000i64)), Some(expected));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp_str("next tuesday"), None);
        assert_eq!(parse_timestamp_str(""), None);
        assert_eq!(parse_timestamp(&serde_json::json!(true)), None);
    }
}
