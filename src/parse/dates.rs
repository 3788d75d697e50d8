use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::model::board::Quarter;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap());

static QUARTER_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Q([1-4])").unwrap());

static YEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+\.?\s+\d{4}$").unwrap());

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());

/// Formats tried, in order, for free-text dates like `March 30, 2026`
const NATURAL_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%Y-%m-%d",
];

/// First embedded `YYYY-MM-DD` that is a real calendar date
pub fn find_iso_date(text: &str) -> Option<NaiveDate> {
    ISO_DATE
        .captures_iter(text)
        .find_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
}

/// Parse a free-text date. Accepts month names (full or short), ordinal
/// days, slash forms, and month-year (`March 2026` → the 1st).
pub fn parse_natural_date(text: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL.replace_all(text.trim(), "$1");
    let cleaned = cleaned
        .trim()
        .trim_end_matches(['.', ';', ')'])
        .trim();
    if cleaned.is_empty() {
        return None;
    }

    // Month and year only. Checked first so `%d` cannot swallow the
    // century digits of the year.
    if MONTH_YEAR.is_match(cleaned) {
        let with_day = format!("1 {}", cleaned.replace('.', ""));
        return NaiveDate::parse_from_str(&with_day, "%d %B %Y").ok();
    }

    NATURAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}

/// Normalize a date-mention start (`2026-01-05` or `2026-01-05T10:00:00Z`)
/// to its calendar date. Unparseable input is returned unchanged.
pub fn normalize_mention_date(start: &str) -> String {
    match start.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        Some(d) => iso(d),
        None => start.to_string(),
    }
}

/// Calendar quarter id for a date, e.g. `2026-Q1`
pub fn quarter_id(date: NaiveDate) -> String {
    format!("{}-Q{}", date.year(), date.month0() / 3 + 1)
}

/// The configured quarter containing `date`, if any
pub fn bucket_date<'a>(date: NaiveDate, quarters: &'a [Quarter]) -> Option<&'a Quarter> {
    let id = quarter_id(date);
    quarters.iter().find(|q| q.id == id)
}

/// Loosely locate a configured quarter in free text: a `Qn` token plus a
/// four-digit year anywhere, falling back to the quarter id or its label and
/// year appearing verbatim.
pub fn find_quarter<'a>(text: &str, quarters: &'a [Quarter]) -> Option<&'a Quarter> {
    let year = YEAR_TOKEN
        .captures(text)
        .and_then(|c| c[1].parse::<i32>().ok());
    let number = QUARTER_TOKEN
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok());

    if let (Some(year), Some(number)) = (year, number)
        && let Some(q) = quarters
            .iter()
            .find(|q| q.year == year && q.number() == Some(number))
    {
        return Some(q);
    }

    quarters.iter().find(|q| {
        text.contains(&q.id) || (text.contains(&q.label) && text.contains(&q.year.to_string()))
    })
}

/// Suggested date for a card dropped into a quarter: the 15th of the
/// quarter's middle month.
pub fn mid_quarter_date(quarter: &Quarter) -> Option<NaiveDate> {
    let n = quarter.number()?;
    NaiveDate::from_ymd_opt(quarter.year, (n - 1) * 3 + 2, 15)
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `March 15, 2026`
pub fn long_form(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `Mar 15, 2026`
pub fn short_form(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
