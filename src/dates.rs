//! Publication date resolution.
//!
//! Dates are recovered through an ordered chain of strategies; the first one
//! that yields a timestamp wins:
//!
//! 1. Structured metadata, tried selector by selector (see [`DATE_SOURCES`])
//! 2. A `/YYYY/MM/DD/` segment in the article URL, at 08:00
//!
//! Whatever the strategy, the result is expressed in the
//! [reference timezone](crate::models::reference_tz). Values without an
//! explicit offset are read as reference-timezone wall-clock time.

use crate::models::reference_tz;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Hour assigned to dates recovered from the URL path.
const URL_DATE_HOUR: u32 = 8;

/// Where a metadata value lives on a matched element.
struct DateSource {
    selector: Selector,
    /// Attributes read in order; the first non-blank one is used.
    attrs: &'static [&'static str],
    /// Fall back to the element's visible text.
    text: bool,
}

impl DateSource {
    fn new(css: &str, attrs: &'static [&'static str], text: bool) -> Self {
        Self {
            selector: Selector::parse(css).unwrap(),
            attrs,
            text,
        }
    }

    fn value(&self, element: ElementRef<'_>) -> Option<String> {
        self.attrs
            .iter()
            .filter_map(|attr| element.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.text
                    .then(|| element.text().collect::<Vec<_>>().join(" ").trim().to_string())
                    .filter(|t| !t.is_empty())
            })
    }
}

/// Metadata selectors in priority order.
static DATE_SOURCES: Lazy<Vec<DateSource>> = Lazy::new(|| {
    vec![
        DateSource::new("meta[property='article:published_time']", &["content"], false),
        DateSource::new("meta[property='article:modified_time']", &["content"], false),
        DateSource::new("meta[name='pubdate']", &["content"], false),
        DateSource::new("meta[name='publishdate']", &["content"], false),
        DateSource::new("[itemprop='datePublished']", &["content", "datetime"], true),
        DateSource::new("time", &["datetime"], true),
        DateSource::new("[class*='date'], [class*='time']", &[], true),
    ]
});

static URL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/").unwrap());

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{4})-(\d{1,2})-(\d{1,2})(?:[T\s]+(\d{1,2}):(\d{2})(?::(\d{2}))?(?:[.,]\d+)?)?\s*(Z|[+-]\d{2}:?\d{2})?",
    )
    .unwrap()
});

static DMY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})").unwrap());

static CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[:hH](\d{2})(?::(\d{2}))?").unwrap());

/// Resolve the publication time of an article.
///
/// # Arguments
///
/// * `article_html` - Body of the article page
/// * `article_url` - URL the body was fetched from
///
/// # Returns
///
/// The timestamp in the reference timezone, or `None` when no strategy
/// succeeds. "No date" is not an error.
#[instrument(level = "debug", skip(article_html))]
pub fn resolve_date(article_html: &str, article_url: &str) -> Option<DateTime<FixedOffset>> {
    let document = Html::parse_document(article_html);
    let resolved = metadata_date(&document).or_else(|| date_from_url(article_url));
    debug!(date = ?resolved, "Resolved publication date");
    resolved
}

/// Try each metadata selector in priority order.
///
/// Only the first element matching a selector is considered; if its value
/// does not parse, the next selector is tried.
pub fn metadata_date(document: &Html) -> Option<DateTime<FixedOffset>> {
    DATE_SOURCES.iter().find_map(|source| {
        let element = document.select(&source.selector).next()?;
        let raw = source.value(element)?;
        parse_datetime(&raw)
    })
}

/// Recover a date from a `/YYYY/MM/DD/` URL segment, at 08:00 reference time.
pub fn date_from_url(url: &str) -> Option<DateTime<FixedOffset>> {
    let caps = URL_DATE.captures(url)?;
    let date = NaiveDate::from_ymd_opt(num(&caps, 1)?, num(&caps, 2)?, num(&caps, 3)?)?;
    let time = NaiveTime::from_hms_opt(URL_DATE_HOUR, 0, 0)?;
    in_reference_tz(NaiveDateTime::new(date, time))
}

/// Parse a free-form date/time string.
///
/// Tried in order: RFC 3339, RFC 2822, an embedded ISO-8601 date(-time)
/// with optional offset, then an embedded `dd/mm/yyyy` date with an
/// optional clock time anywhere in the string. Date-only values resolve to
/// midnight.
pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let tz = reference_tz();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&tz));
    }

    parse_iso_fragment(raw).or_else(|| parse_dmy_fragment(raw))
}

fn parse_iso_fragment(raw: &str) -> Option<DateTime<FixedOffset>> {
    let caps = ISO_DATE.captures(raw)?;
    let date = NaiveDate::from_ymd_opt(num(&caps, 1)?, num(&caps, 2)?, num(&caps, 3)?)?;
    let time = match caps.get(4) {
        Some(_) => NaiveTime::from_hms_opt(
            num(&caps, 4)?,
            num(&caps, 5)?,
            num(&caps, 6).unwrap_or(0),
        )?,
        None => NaiveTime::MIN,
    };
    let naive = NaiveDateTime::new(date, time);

    match caps.get(7) {
        Some(offset) => {
            let offset = parse_offset(offset.as_str())?;
            let dt = offset.from_local_datetime(&naive).single()?;
            Some(dt.with_timezone(&reference_tz()))
        }
        None => in_reference_tz(naive),
    }
}

fn parse_dmy_fragment(raw: &str) -> Option<DateTime<FixedOffset>> {
    let caps = DMY_DATE.captures(raw)?;
    let found = caps.get(0)?;
    let date = NaiveDate::from_ymd_opt(num(&caps, 3)?, num(&caps, 2)?, num(&caps, 1)?)?;

    // The clock may sit before or after the date ("10:00 | 01/03/2024"); the
    // nearest one wins. A signed token such as "GMT+07:00" is an offset.
    let time = CLOCK
        .captures_iter(raw)
        .filter_map(|c| {
            let clock = c.get(0)?;
            if raw[..clock.start()].ends_with(['+', '-']) {
                return None;
            }
            let distance = if clock.end() <= found.start() {
                found.start() - clock.end()
            } else if clock.start() >= found.end() {
                clock.start() - found.end()
            } else {
                return None;
            };
            let time = NaiveTime::from_hms_opt(num(&c, 1)?, num(&c, 2)?, num(&c, 3).unwrap_or(0))?;
            Some((distance, time))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, time)| time)
        .unwrap_or(NaiveTime::MIN);

    in_reference_tz(NaiveDateTime::new(date, time))
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = s[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn in_reference_tz(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    reference_tz().from_local_datetime(&naive).single()
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, i: usize) -> Option<T> {
    caps.get(i)?.as_str().parse().ok()
}
