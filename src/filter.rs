//! Query-string parsing for list endpoints.
//!
//! Recognized parameters:
//! - resource filters named in the policy (`date_from`, `min_amount`, ...)
//! - `search`: whitespace or comma separated terms, matched with SQLite
//!   `LIKE` (ASCII letters fold case, other characters match exactly)
//! - `ordering`: comma separated field names, `-` prefix for descending
//!
//! Anything else is ignored. A recognized filter with an unreadable value is
//! a validation error under the parameter's name.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::config::ResourcePolicy;
use crate::error::{FieldErrors, LedgerError};

/// A resource-specific set of filter predicates.
pub trait FilterSet: Default {
    /// Record `name=value`. Names this set does not know are ignored.
    fn apply(&mut self, name: &str, value: &str) -> Result<(), String>;
}

/// Resources without filters.
impl FilterSet for () {
    fn apply(&mut self, _name: &str, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery<F> {
    pub filters: F,
    /// Every term must match some search field.
    pub search: Vec<String>,
    pub search_fields: Vec<String>,
    /// Empty means the resource's default order.
    pub ordering: Vec<OrderBy>,
}

impl<F: FilterSet> ListQuery<F> {
    pub fn parse(query: Option<&str>, policy: &ResourcePolicy) -> Result<Self, LedgerError> {
        let mut out = ListQuery {
            filters: F::default(),
            search: Vec::new(),
            search_fields: policy.search_fields.clone(),
            ordering: Vec::new(),
        };
        let mut errors = FieldErrors::default();

        let Some(query) = query else {
            return Ok(out);
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "search" => {
                    if !policy.search_fields.is_empty() {
                        out.search.extend(
                            value
                                .split(|c: char| c.is_whitespace() || c == ',')
                                .filter(|t| !t.is_empty())
                                .map(str::to_string),
                        );
                    }
                }
                "ordering" => {
                    out.ordering.extend(value.split(',').filter_map(|raw| {
                        let raw = raw.trim();
                        let (field, descending) = match raw.strip_prefix('-') {
                            Some(f) => (f, true),
                            None => (raw, false),
                        };
                        policy.allows_ordering(field).then(|| OrderBy {
                            field: field.to_string(),
                            descending,
                        })
                    }));
                }
                name if policy.allows_filter(name) && !value.is_empty() => {
                    if let Err(msg) = out.filters.apply(name, value) {
                        errors.push(name, msg);
                    }
                }
                _ => {}
            }
        }

        errors.into_result()?;
        Ok(out)
    }
}

/// Transaction predicates. Amount bounds are held in cents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub category: Option<i64>,
    pub account: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_amount_cents: Option<i64>,
    pub max_amount_cents: Option<i64>,
}

fn parse_id(value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| "Select a valid choice. That choice is not one of the available choices.".to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| "Enter a valid date.".to_string())
}

/// Inclusive bound in cents: rounds up for a lower bound, down for an upper one.
fn parse_amount_bound(value: &str, lower: bool) -> Result<i64, String> {
    let amount = Decimal::from_str(value).map_err(|_| "Enter a number.".to_string())?;
    let scaled = amount * Decimal::ONE_HUNDRED;
    let rounded = if lower { scaled.ceil() } else { scaled.floor() };
    rounded.to_i64().ok_or_else(|| "Enter a number.".to_string())
}

impl FilterSet for TransactionFilter {
    fn apply(&mut self, name: &str, value: &str) -> Result<(), String> {
        match name {
            "category" => self.category = Some(parse_id(value)?),
            "account" => self.account = Some(parse_id(value)?),
            "date_from" => self.date_from = Some(parse_date(value)?),
            "date_to" => self.date_to = Some(parse_date(value)?),
            "min_amount" => self.min_amount_cents = Some(parse_amount_bound(value, true)?),
            "max_amount" => self.max_amount_cents = Some(parse_amount_bound(value, false)?),
            _ => {}
        }
        Ok(())
    }
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` substring pattern.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
