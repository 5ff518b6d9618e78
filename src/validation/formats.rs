use crate::models::schema::Format;
use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;
use uuid::Uuid;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").ok());

pub fn is_uuid(text: &str) -> bool {
    Uuid::try_parse(text).is_ok()
}

pub fn is_email(text: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(text))
}

/// RFC 3339 timestamp with offset
pub fn is_date_time(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
}

pub fn is_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`, optionally suffixed with `Z`
pub fn is_time(text: &str) -> bool {
    let text = text.strip_suffix('Z').unwrap_or(text);
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(text, fmt).is_ok())
}

/// Absolute URI
pub fn is_uri(text: &str) -> bool {
    Url::parse(text).is_ok()
}

/// Check a string against a format. Unknown formats always pass.
pub fn conforms(format: &Format, text: &str) -> bool {
    match format {
        Format::Uuid => is_uuid(text),
        Format::Email => is_email(text),
        Format::DateTime => is_date_time(text),
        Format::Date => is_date(text),
        Format::Time => is_time(text),
        Format::Uri => is_uri(text),
        Format::Other(_) => true,
    }
}
