//! Size and timestamp formatting used by the listing endpoint

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Timestamp layout of `modified_fmt`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Format a byte count the way the server reports `size_fmt`
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

/// Recover an approximate byte count from a `size_fmt` string
pub fn parse_size(s: &str) -> Option<u64> {
    let mut parts = s.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let unit = parts.next().unwrap_or("B");
    if parts.next().is_some() || value < 0.0 {
        return None;
    }

    let exponent = match unit.to_ascii_uppercase().as_str() {
        "B" => 0,
        "KB" => 1,
        "MB" => 2,
        "GB" => 3,
        "TB" => 4,
        "PB" => 5,
        _ => return None,
    };

    Some((value * 1024f64.powi(exponent)).round() as u64)
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

/// Convert a Unix timestamp in seconds to local wall-clock time
pub fn timestamp_from_epoch(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(whole, nanos).map(|dt| dt.with_timezone(&Local).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(5), "5.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024u64.pow(5)), "1.0 PB");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0.0 B"), Some(0));
        assert_eq!(parse_size("100.0 B"), Some(100));
        assert_eq!(parse_size("1.5 KB"), Some(1536));
        assert_eq!(parse_size("2.0 MB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("12"), Some(12));
        assert_eq!(parse_size("1.0 XB"), None);
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("abc KB"), None);
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = parse_timestamp("2023-11-05 08:09:10").unwrap();
        assert_eq!(format_timestamp(ts), "2023-11-05 08:09:10");
        assert!(parse_timestamp("05/11/2023").is_none());
    }

    #[test]
    fn test_timestamp_from_epoch() {
        assert!(timestamp_from_epoch(1_700_000_000.5).is_some());
        assert!(timestamp_from_epoch(f64::NAN).is_none());
    }
}
