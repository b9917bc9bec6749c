use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde_json::Value;

/// Formats accepted for timestamps without an offset. These are read as
/// wall-clock time in the local timezone.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Returns at most `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reads a timestamp out of a JSON value. Strings go through
/// [`parse_timestamp_str`], numbers are epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Local>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Local.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

pub fn parse_timestamp_str(raw: &str) -> Option<DateTime<Local>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Local));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    // Bare dates are midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).with_timezone(&Local));
    }

    None
}

/// Local wall-clock start, truncated to the minute.
pub fn local_start(dt: &DateTime<Local>) -> NaiveDateTime {
    let naive = dt.naive_local();
    naive
        .with_second(0)
        .and_then(|n| n.with_nanosecond(0))
        .unwrap_or(naive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    fn components(dt: NaiveDateTime) -> [u32; 5] {
        [
            dt.year() as u32,
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
        ]
    }

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(
            collapse_whitespace("  LA Surf\n\t Soccer   Club \u{a0}vs  Tigers "),
            "LA Surf Soccer Club vs Tigers"
        );
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("abc", 80), "abc");
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
        assert_eq!(truncate_chars(&"x".repeat(100), 80).len(), 80);
    }

    #[test]
    fn offsetless_timestamp_keeps_wall_clock() {
        let dt = parse_timestamp_str("2024-03-10T15:30:00").unwrap();
        assert_eq!(components(local_start(&dt)), [2024, 3, 10, 15, 30]);
    }

    #[test]
    fn offset_timestamp_is_converted_to_local() {
        let dt = parse_timestamp_str("2024-04-01T09:00:00Z").unwrap();
        let expected = Utc
            .with_ymd_and_hms(2024, 4, 1, 9, 0, 0)
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(dt, expected);
    }

    #[test]
    fn http_date_is_read_as_utc() {
        let dt = parse_timestamp_str("Mon, 01 Apr 2024 09:00:00 GMT").unwrap();
        let expected = Utc
            .with_ymd_and_hms(2024, 4, 1, 9, 0, 0)
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(dt, expected);

        let offset = parse_timestamp_str("Mon, 01 Apr 2024 11:00:00 +0200").unwrap();
        assert_eq!(offset, expected);
    }

    #[test]
    fn seconds_are_dropped_from_start() {
        let dt = parse_timestamp_str("2024-03-10T15:30:45.250").unwrap();
        let start = local_start(&dt);
        assert_eq!(start.second(), 0);
        assert_eq!(start.minute(), 30);
    }

    #[test]
    fn numbers_are_epoch_millis() {
        let dt = parse_timestamp(&json!(1_711_962_000_000i64)).unwrap();
        assert_eq!(dt.with_timezone(&Utc).to_rfc3339(), "2024-04-01T09:00:00+00:00");
    }

    #[test]
    fn garbage_is_not_a_timestamp() {
        assert!(parse_timestamp_str("next saturday").is_none());
        assert!(parse_timestamp_str("   ").is_none());
        assert!(parse_timestamp(&json!(null)).is_none());
        assert!(parse_timestamp(&json!({"at": "2024-01-01"})).is_none());
    }
}
