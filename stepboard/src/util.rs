use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parses a backend timestamp. Accepts RFC 3339, naive date-times (read as
/// UTC) and bare dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Contest ids handed between screens arrive as loose text.
pub fn parse_contest_id(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u64>().ok().filter(|id| *id > 0)
}

/// `2025.3.7` style date used on membership badges.
pub(crate) fn format_badge_date(value: &str) -> Option<String> {
    let parsed = parse_timestamp(value)?;
    Some(format!(
        "{}.{}.{}",
        parsed.year(),
        parsed.month(),
        parsed.day()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_in_common_shapes() {
        let rfc = parse_timestamp("2025-03-07T10:00:00+08:00").expect("rfc3339");
        assert_eq!(rfc.to_rfc3339(), "2025-03-07T02:00:00+00:00");

        let naive = parse_timestamp("2025-03-07 10:00:00").expect("naive");
        assert_eq!(naive.to_rfc3339(), "2025-03-07T10:00:00+00:00");

        assert!(parse_timestamp("2025-03-07").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("  ").is_none());
    }

    #[test]
    fn contest_ids_reject_garbage() {
        assert_eq!(parse_contest_id(" 42 "), Some(42));
        assert_eq!(parse_contest_id(""), None);
        assert_eq!(parse_contest_id("0"), None);
        assert_eq!(parse_contest_id("NaN"), None);
        assert_eq!(parse_contest_id("-3"), None);
    }

    #[test]
    fn badge_dates_drop_padding() {
        assert_eq!(
            format_badge_date("2025-03-07T00:00:00Z").as_deref(),
            Some("2025.3.7")
        );
        assert_eq!(format_badge_date("soon"), None);
    }
}
