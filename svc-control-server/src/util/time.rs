use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Parses RFC 3339, or `YYYY-MM-DD` as midnight UTC.
pub fn parse_date_or_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

pub fn de_opt_date_or_rfc3339<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(d)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date_or_rfc3339(s).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date \"{s}\" (expected RFC3339 or YYYY-MM-DD)"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date_or_rfc3339("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date_or_rfc3339("2024-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_date_or_rfc3339("2024-01-01"), Some(expected));
        assert_eq!(parse_date_or_rfc3339("01/01/2024"), None);
    }
}
