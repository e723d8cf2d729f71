use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Output layout for normalized publication dates.
pub const OUTPUT_FORMAT: &str = "%Y/%m/%d";

/// Date-time layouts without a zone, tried after RFC 2822 and RFC 3339.
/// `%.f` also matches when the fraction is absent.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%a, %d %b %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%m/%d/%Y",
];

/// Converts a feed `pubDate` into `yyyy/MM/dd`.
///
/// Never fails: input that matches none of the accepted layouts yields an
/// empty string. The calendar date is the one written in the input, so
/// `"Wed, 02 Oct 2019 00:00:00 Z"` becomes `"2019/10/02"` regardless of the
/// local time zone.
pub fn normalize_pub_date(raw: &str) -> String {
    match parse_calendar_date(raw) {
        Some(date) => date.format(OUTPUT_FORMAT).to_string(),
        None => {
            tracing::debug!(raw = %raw, "Unparseable pubDate, leaving column empty");
            String::new()
        }
    }
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let rfc2822 = normalize_zone(trimmed);
    if let Ok(dt) = DateTime::parse_from_rfc2822(&rfc2822) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        })
}

/// Rewrites the `Z` and `UTC` designators some feeds use in RFC 2822 dates
/// into the numeric `+0000` that chrono accepts.
fn normalize_zone(value: &str) -> String {
    for suffix in [" Z", " UTC"] {
        if let Some(head) = value.strip_suffix(suffix) {
            return format!("{head} +0000");
        }
    }
    value.to_string()
}
