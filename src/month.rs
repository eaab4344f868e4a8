//! First-of-month normalization for budget months and summary ranges.
//!
//! Month input is lenient: anything that cannot be read as a month resolves
//! to the current month instead of rejecting the write.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// The shapes a month value can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthInput<'a> {
    /// Missing, `null` or blank.
    Absent,
    /// `YYYY-MM`
    YearMonth(&'a str),
    /// `YYYY-MM-DD`, or a datetime string whose date part is used.
    FullDate(&'a str),
    /// Already a date.
    Date(NaiveDate),
    /// Present but not a string (number, object, ...).
    Unrecognized,
}

impl<'a> MonthInput<'a> {
    pub fn from_json(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => MonthInput::Absent,
            Some(Value::String(s)) => MonthInput::from_text(s),
            Some(_) => MonthInput::Unrecognized,
        }
    }

    pub fn from_text(raw: &'a str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            MonthInput::Absent
        } else if s.len() == 7 && s.as_bytes()[4] == b'-' {
            MonthInput::YearMonth(s)
        } else {
            MonthInput::FullDate(s)
        }
    }

    /// Resolve to the first day of a month, falling back to `today`'s month.
    pub fn normalize(self, today: NaiveDate) -> NaiveDate {
        let parsed = match self {
            MonthInput::Absent | MonthInput::Unrecognized => None,
            MonthInput::YearMonth(s) => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok(),
            MonthInput::FullDate(s) => parse_date_like(s),
            MonthInput::Date(d) => Some(d),
        };
        first_of_month(parsed.unwrap_or(today))
    }
}

fn parse_date_like(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Current date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Inclusive `[first, last]` day range of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((start, end))
}

/// `YYYY-MM` key for a date.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
