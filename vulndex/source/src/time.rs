use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Best-effort parse of the timestamp formats the source trees use.
/// `None` means unparseable; ordering code treats that as the epoch.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    // legacy NVD feeds drop the seconds: 2019-05-14T19:29Z
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ") {
        return Some(ts.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepted_formats() {
        assert!(parse_timestamp("2023-08-08T18:17:02Z").is_some());
        assert!(parse_timestamp("2023-08-08T18:17:02+02:00").is_some());
        assert!(parse_timestamp("2019-05-14T19:29Z").is_some());
        assert!(parse_timestamp("2019-05-14").is_some());
    }

    #[test]
    fn rejected_values() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("14/05/2019").is_none());
    }
}
