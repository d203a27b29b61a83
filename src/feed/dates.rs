use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Reverse;

/// Day-month-year layouts tried once the weekday is gone and the zone is
/// numeric.
const RFC2822_LOOSE_FORMATS: &[&str] = &["%d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M %z"];

/// ISO 8601 variants RFC 3339 rejects, such as a missing seconds field.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%#z",
    "%Y-%m-%d %H:%M:%S %#z",
];

/// Offset-less layouts some publishers use; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses a feed timestamp for ordering purposes.
///
/// Accepts RFC 2822 (`Mon, 01 Jan 2024 10:00:00 GMT`, RSS), RFC 3339
/// (`2024-01-01T10:00:00+00:00`, Atom), bare dates (`2024-01-01`) and
/// offset-less date-times. RSS dates are read leniently: the weekday is
/// ignored (full names and mismatched days included) and zone names such as
/// `UTC` or `CEST` become offsets. Returns `None` for anything else; the
/// original string is never modified by the parsers.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    // Zone names are rewritten before chrono sees them
    if let Some(dt) = parse_loose_rfc2822(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }
    parse_loose_iso(raw)
}

fn parse_loose_rfc2822(raw: &str) -> Option<DateTime<FixedOffset>> {
    let normalized = normalize_rfc2822(raw)?;
    if let Ok(dt) = DateTime::parse_from_rfc2822(&normalized) {
        return Some(dt);
    }
    RFC2822_LOOSE_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
}

fn parse_loose_iso(raw: &str) -> Option<DateTime<FixedOffset>> {
    let with_offset = match raw.strip_suffix(|c: char| c.eq_ignore_ascii_case(&'Z')) {
        Some(local) => format!("{local}+00:00"),
        None => raw.to_string(),
    };
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&with_offset, format).ok())
    {
        return Some(dt);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Drops a leading weekday and rewrites a trailing zone name as an offset.
///
/// Returns `None` when nothing changed.
fn normalize_rfc2822(raw: &str) -> Option<String> {
    let without_day = match raw.split_once(',') {
        Some((day, rest)) if is_word(day.trim()) => rest,
        _ => raw,
    };

    let mut tokens: Vec<&str> = without_day.split_whitespace().collect();
    if tokens.len() > 1
        && is_word(tokens[0])
        && tokens[1].starts_with(|c: char| c.is_ascii_digit())
    {
        tokens.remove(0);
    }
    if let Some(last) = tokens.last_mut() {
        if let Some(offset) = zone_offset(*last) {
            *last = offset;
        }
    }

    let normalized = tokens.join(" ");
    (normalized != raw).then_some(normalized)
}

fn is_word(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic())
}

fn zone_offset(zone: &str) -> Option<&'static str> {
    let offset = match zone.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => "+0000",
        "EST" => "-0500",
        "EDT" => "-0400",
        "CST" => "-0600",
        "CDT" => "-0500",
        "MST" => "-0700",
        "MDT" => "-0600",
        "PST" => "-0800",
        "PDT" => "-0700",
        "BST" | "CET" => "+0100",
        "CEST" | "EET" => "+0200",
        "EEST" => "+0300",
        "JST" => "+0900",
        "AEST" => "+1000",
        "AEDT" => "+1100",
        _ => return None,
    };
    Some(offset)
}

/// Sorts records newest first by the timestamp `date_of` returns.
///
/// Unparsable dates sort after every valid one. The sort is stable, so
/// records with equal or invalid dates keep their feed order.
pub fn sort_newest_first<T>(records: &mut [T], date_of: impl Fn(&T) -> &str) {
    records.sort_by_cached_key(|record| match parse_feed_date(date_of(record)) {
        Some(dt) => (false, Reverse(dt.with_timezone(&Utc))),
        None => (true, Reverse(DateTime::<Utc>::MIN_UTC)),
    });
}
