//! Timestamp parsing shared by query strings and request bodies.
//!
//! Accepts RFC 3339 (`2025-06-02T10:00:00Z`, `...+02:00`) and naive ISO 8601
//! (`2025-06-02T10:00:00`, optional fraction, `T` or space separator). A
//! naive value is read as UTC.
//!
//! Use on request fields with `deserialize_with`:
//!
//! ```
//! use chrono::{DateTime, Utc};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Body {
//!     #[serde(deserialize_with = "venue_booking_core::timestamp::deserialize")]
//!     at: DateTime<Utc>,
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp, or `None` if `raw` is in neither accepted form.
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Deserialize a required timestamp.
///
/// # Errors
///
/// Returns a deserializer error for a non-string or unparseable value.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Deserialize an optional timestamp; `null` is `None`.
///
/// # Errors
///
/// Returns a deserializer error for an unparseable value.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'"))))
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Deserialize)]
    struct Window {
        #[serde(deserialize_with = "deserialize")]
        start: DateTime<Utc>,
        #[serde(default, deserialize_with = "deserialize_option")]
        end: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_accepted_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        for raw in [
            "2025-06-02T10:00:00Z",
            "2025-06-02T12:00:00+02:00",
            "2025-06-02T10:00:00",
            "2025-06-02T10:00:00.000000",
            "2025-06-02 10:00:00",
            " 2025-06-02T10:00:00 ",
        ] {
            assert_eq!(parse(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse("tomorrow"), None);
        assert_eq!(parse("2025-06-02"), None);
    }

    #[test]
    fn test_deserialize_naive_and_optional() {
        let window: Window =
            serde_json::from_str(r#"{"start":"2025-06-02T10:00:00","end":null}"#).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap());
        assert_eq!(window.end, None);

        let window: Window =
            serde_json::from_str(r#"{"start":"2025-06-02T10:00:00Z"}"#).unwrap();
        assert_eq!(window.end, None);

        let err = serde_json::from_str::<Window>(r#"{"start":"soon"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp 'soon'"));
    }
}
