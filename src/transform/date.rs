//! Submission timestamp reformatting

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const OUTPUT_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// `%#z` accepts `+hh:mm`, `+hhmm` and `+hh`
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Reformat an ISO-8601 timestamp as `YYYY.MM.DD HH:MM:SS`.
///
/// The wall-clock time is kept in whatever offset the input carries. An
/// empty input yields `None`; anything unparseable is passed through as-is.
pub fn format_timestamp(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(parse(raw.trim()).unwrap_or_else(|| raw.to_string()))
}

fn parse(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format(OUTPUT_FORMAT).to_string());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.format(OUTPUT_FORMAT).to_string());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.format(OUTPUT_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(OUTPUT_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_suffix() {
        assert_eq!(
            format_timestamp("2025-03-04T05:06:07Z").as_deref(),
            Some("2025.03.04 05:06:07")
        );
    }

    #[test]
    fn test_offset_is_kept_not_converted() {
        assert_eq!(
            format_timestamp("2025-03-04T05:06:07.123-05:00").as_deref(),
            Some("2025.03.04 05:06:07")
        );
        assert_eq!(
            format_timestamp("2025-03-04 05:06:07+02:00").as_deref(),
            Some("2025.03.04 05:06:07")
        );
    }

    #[test]
    fn test_compact_and_hour_only_offsets() {
        assert_eq!(
            format_timestamp("2025-03-04T05:06:07+0000").as_deref(),
            Some("2025.03.04 05:06:07")
        );
        assert_eq!(
            format_timestamp("2025-03-04T05:06:07+00").as_deref(),
            Some("2025.03.04 05:06:07")
        );
        assert_eq!(
            format_timestamp("2025-03-04 05:06:07.5-0330").as_deref(),
            Some("2025.03.04 05:06:07")
        );
    }

    #[test]
    fn test_naive_and_date_only() {
        assert_eq!(
            format_timestamp("2025-12-06T23:59:01").as_deref(),
            Some("2025.12.06 23:59:01")
        );
        assert_eq!(
            format_timestamp("2025-12-06").as_deref(),
            Some("2025.12.06 00:00:00")
        );
    }

    #[test]
    fn test_unparseable_passes_through() {
        assert_eq!(
            format_timestamp("yesterday-ish").as_deref(),
            Some("yesterday-ish")
        );
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(format_timestamp(""), None);
    }
}
