//! Date helper functions

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt::Write;

use crate::config::SiteConfig;

/// The one date display policy used by every page
#[derive(Debug, Clone)]
pub struct DatePolicy {
    timezone: Tz,
    format: String,
}

impl DatePolicy {
    /// Build the policy from `timezone` and `date_format`
    pub fn from_config(config: &SiteConfig) -> Self {
        let timezone = if config.timezone.is_empty() {
            Tz::UTC
        } else {
            config.timezone.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!("Unknown timezone {:?}, using UTC", config.timezone);
                Tz::UTC
            })
        };
        let format = if is_valid_date_format(&config.date_format) {
            moment_to_chrono_format(&config.date_format)
        } else {
            tracing::warn!("Invalid date_format {:?}, using default", config.date_format);
            DEFAULT_FORMAT.to_string()
        };
        Self { timezone, format }
    }

    /// Human-readable date in the site's timezone
    pub fn display(&self, date: &DateTime<Utc>) -> String {
        let local = date.with_timezone(&self.timezone);
        let mut out = String::new();
        if write!(out, "{}", local.format(&self.format)).is_err() {
            return date_xml(&local);
        }
        out
    }

    /// Machine-readable value for `<time datetime="...">`
    pub fn machine(&self, date: &DateTime<Utc>) -> String {
        date_xml(&date.with_timezone(&self.timezone))
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

const DEFAULT_FORMAT: &str = "%d %b %Y";

/// Whether a Moment.js style format converts to a usable chrono format
pub fn is_valid_date_format(format: &str) -> bool {
    StrftimeItems::new(&moment_to_chrono_format(format)).all(|item| !matches!(item, Item::Error))
}

/// Convert Moment.js format to chrono format; a literal `%` is kept as text
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each group
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.replace('%', "%%");

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
