use axum::{
    Json,
    extract::{RawQuery, State},
};
use chrono::{Datelike, NaiveDate};

use crate::error::LedgerError;
use crate::middleware::auth::AuthUser;
use crate::month;
use crate::service::summary::SummaryEngine;
use crate::types::summary::MonthlySummary;

#[derive(Debug, Default)]
pub struct SummaryQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

impl SummaryQuery {
    /// Read `year` and `month` from a raw query string. A repeated key keeps
    /// its last value; other keys are ignored.
    pub fn parse(query: Option<&str>) -> Self {
        let mut out = SummaryQuery::default();
        let Some(query) = query else {
            return out;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "year" => out.year = Some(value.into_owned()),
                "month" => out.month = Some(value.into_owned()),
                _ => {}
            }
        }
        out
    }
}

/// Target (year, month). Each part that is missing, non-numeric or out of
/// range falls back to `today`'s.
pub fn resolve_period(query: &SummaryQuery, today: NaiveDate) -> (i32, u32) {
    let year = query
        .year
        .as_deref()
        .and_then(|y| y.trim().parse::<i32>().ok())
        .filter(|y| (1..=9999).contains(y))
        .unwrap_or_else(|| today.year());
    let month = query
        .month
        .as_deref()
        .and_then(|m| m.trim().parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m))
        .unwrap_or_else(|| today.month());
    (year, month)
}

/// GET /api/finance/summary?year=YYYY&month=M
pub async fn monthly_summary(
    State(engine): State<SummaryEngine>,
    AuthUser(owner): AuthUser,
    RawQuery(query): RawQuery,
) -> Result<Json<MonthlySummary>, LedgerError> {
    let query = SummaryQuery::parse(query.as_deref());
    let (year, month) = resolve_period(&query, month::today());
    let summary = engine.summarize(owner, year, month).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(year: Option<&str>, month: Option<&str>) -> SummaryQuery {
        SummaryQuery {
            year: year.map(str::to_string),
            month: month.map(str::to_string),
        }
    }

    #[test]
    fn explicit_period_is_used() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(resolve_period(&q(Some("2025"), Some("8")), today), (2025, 8));
        assert_eq!(resolve_period(&q(Some("2025"), Some("08")), today), (2025, 8));
    }

    #[test]
    fn malformed_parts_default_independently() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(resolve_period(&q(None, None), today), (2026, 10));
        assert_eq!(resolve_period(&q(Some("abc"), Some("3")), today), (2026, 3));
        assert_eq!(resolve_period(&q(Some("2024"), Some("13")), today), (2024, 10));
        assert_eq!(resolve_period(&q(Some("2024"), Some("0")), today), (2024, 10));
        assert_eq!(resolve_period(&q(Some(""), Some("-1")), today), (2026, 10));
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let query = SummaryQuery::parse(Some("year=2025&year=2024&month=8&foo=1"));
        assert_eq!(query.year.as_deref(), Some("2024"));
        assert_eq!(query.month.as_deref(), Some("8"));

        let query = SummaryQuery::parse(Some("year&month=%2012"));
        assert_eq!(query.year.as_deref(), Some(""));
        assert_eq!(query.month.as_deref(), Some(" 12"));
        assert!(SummaryQuery::parse(None).year.is_none());
    }
}
