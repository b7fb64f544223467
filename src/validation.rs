// Input parsing helpers shared by the booking and payment handlers

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Parses a client-supplied booking date.
///
/// Accepts an RFC 3339 timestamp (`2024-06-01T14:00:00+02:00`), a naive
/// timestamp (`2024-06-01T14:00:00`, read as UTC) or a calendar date
/// (`2024-06-01`, read as 00:00 UTC). Returns `None` for anything else.
pub fn parse_booking_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Returns the trimmed value when present and non-blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses an identifier taken from a request body
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Provider references travel in a URL path segment, so only the characters
/// payment providers actually issue are accepted. A reference must carry at
/// least one letter or digit, which rules out `.` and `..` segments.
pub fn is_valid_provider_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= 100
        && reference.chars().any(|c| c.is_ascii_alphanumeric())
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '='))
}
