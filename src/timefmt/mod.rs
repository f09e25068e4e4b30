//! Timestamp normalization for display.
//!
//! Converts the heterogeneous raw timestamp forms the server emits into a
//! single locale-aware display string, with the format chosen by recency
//! relative to an injected "now". Injecting `now` keeps the function pure:
//! the same input always yields the same output for the same instant.

use chrono::{DateTime, Datelike, Locale, TimeZone};

use crate::types::RawTimestamp;

/// Locale used when the caller has none available.
pub const DEFAULT_LOCALE: Locale = Locale::en_US;

/// Format a raw timestamp for display relative to `now`.
///
/// Returns an empty string for unparseable input. Four formats by recency:
/// same calendar day shows time only, the previous day gets a "yesterday"
/// prefix, the same calendar year shows month/day + time, anything else
/// the full date + time.
pub fn format_timestamp<Tz>(raw: &RawTimestamp, now: DateTime<Tz>, locale: Locale) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let Some(instant) = raw.resolve() else {
        return String::new();
    };
    let local = instant.with_timezone(&now.timezone());

    let today = now.date_naive();
    let date = local.date_naive();

    if date == today {
        return local.format_localized("%H:%M", locale).to_string();
    }
    if Some(date) == today.pred_opt() {
        return format!("yesterday {}", local.format_localized("%H:%M", locale));
    }
    if date.year() == today.year() {
        return local.format_localized("%m/%d %H:%M", locale).to_string();
    }
    local.format_localized("%Y/%m/%d %H:%M", locale).to_string()
}

/// Format with the default locale.
pub fn format_timestamp_default<Tz>(raw: &RawTimestamp, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format_timestamp(raw, now, DEFAULT_LOCALE)
}
