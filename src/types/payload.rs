//! Request bodies for create and partial update.
//!
//! Bodies are read field by field so every problem is reported under the
//! field it belongs to. Unknown keys (including any owner/`user` field) are
//! ignored: the owner always comes from the request identity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::db::models::{AccountType, CategoryKind, decimal_to_cents};
use crate::error::{FieldErrors, LedgerError};
use crate::month::{self, MonthInput};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 255;
const MONEY_INTEGER_DIGITS: u32 = 10;

pub trait Payload: Sized {
    fn from_json(value: &Value) -> Result<Self, LedgerError>;
}

/// A JSON value convertible into a typed field.
pub trait FieldValue: Sized {
    fn read(value: &Value) -> Result<Self, String>;
}

impl FieldValue for String {
    fn read(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err("Not a valid string.".to_string()),
        }
    }
}

impl FieldValue for i64 {
    fn read(value: &Value) -> Result<Self, String> {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| "A valid integer is required.".to_string())
    }
}

impl FieldValue for NaiveDate {
    fn read(value: &Value) -> Result<Self, String> {
        value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .ok_or_else(|| "Date has wrong format. Use YYYY-MM-DD.".to_string())
    }
}

impl FieldValue for Decimal {
    fn read(value: &Value) -> Result<Self, String> {
        let parsed = match value {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        };
        parsed.ok_or_else(|| "A valid number is required.".to_string())
    }
}

fn read_choice<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|_| format!("{value} is not a valid choice."))
}

impl FieldValue for AccountType {
    fn read(value: &Value) -> Result<Self, String> {
        read_choice(value)
    }
}

impl FieldValue for CategoryKind {
    fn read(value: &Value) -> Result<Self, String> {
        read_choice(value)
    }
}

/// Collects per-field errors while pulling typed values out of a JSON object.
pub struct PayloadReader<'a> {
    body: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> PayloadReader<'a> {
    pub fn new(value: &'a Value) -> Result<Self, LedgerError> {
        match value.as_object() {
            Some(body) => Ok(Self {
                body,
                errors: FieldErrors::default(),
            }),
            None => Err(LedgerError::invalid(
                "non_field_errors",
                "Invalid data. Expected an object.",
            )),
        }
    }

    pub fn raw(&self, field: &str) -> Option<&'a Value> {
        self.body.get(field)
    }

    fn parse<T: FieldValue>(&mut self, field: &str, value: &Value) -> Option<T> {
        T::read(value)
            .map_err(|msg| self.errors.push(field, msg))
            .ok()
    }

    /// Must be present and non-null.
    pub fn required<T: FieldValue>(&mut self, field: &str) -> Option<T> {
        let body = self.body;
        match body.get(field) {
            None => {
                self.errors.push(field, "This field is required.");
                None
            }
            Some(Value::Null) => {
                self.errors.push(field, "This field may not be null.");
                None
            }
            Some(v) => self.parse(field, v),
        }
    }

    /// Absent or null reads as `None`.
    pub fn optional<T: FieldValue>(&mut self, field: &str) -> Option<T> {
        let body = self.body;
        match body.get(field) {
            None | Some(Value::Null) => None,
            Some(v) => self.parse(field, v),
        }
    }

    /// Absent -> `None`, `null` -> `Some(None)`.
    pub fn nullable<T: FieldValue>(&mut self, field: &str) -> Option<Option<T>> {
        let body = self.body;
        match body.get(field) {
            None => None,
            Some(Value::Null) => Some(None),
            Some(v) => self.parse(field, v).map(Some),
        }
    }

    /// Present but `null` is rejected; absent reads as `None`.
    pub fn patch<T: FieldValue>(&mut self, field: &str) -> Option<T> {
        match self.body.get(field) {
            None => None,
            Some(_) => self.required(field),
        }
    }

    pub fn name(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = value?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.errors.push(field, "This field may not be blank.");
            return None;
        }
        self.text_len(field, trimmed.to_string(), NAME_MAX)
    }

    pub fn description(&mut self, value: Option<String>) -> Option<String> {
        self.text_len("description", value?, DESCRIPTION_MAX)
    }

    fn text_len(&mut self, field: &str, value: String, max: usize) -> Option<String> {
        if value.chars().count() > max {
            self.errors
                .push(field, format!("Ensure this field has no more than {max} characters."));
            return None;
        }
        Some(value)
    }

    /// Money: at most 2 fractional digits and 10 integer digits, returned as cents.
    pub fn money(&mut self, field: &str, value: Option<Decimal>) -> Option<i64> {
        let value = value?;
        let bound = Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS));
        if value.abs() >= bound {
            self.errors.push(
                field,
                format!("Ensure that there are no more than {MONEY_INTEGER_DIGITS} digits before the decimal point."),
            );
            return None;
        }
        match decimal_to_cents(value) {
            Some(cents) => Some(cents),
            None => {
                self.errors
                    .push(field, "Ensure that there are no more than 2 decimal places.");
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), LedgerError> {
        self.errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountDraft {
    pub name: String,
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
}

impl Payload for AccountDraft {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let name = r.required("name");
        let name = r.name("name", name);
        let account_type = r.optional("type").unwrap_or_default();
        r.finish()?;
        Ok(Self {
            name: name.unwrap_or_default(),
            account_type,
        })
    }
}

impl Payload for AccountPatch {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let name = r.patch("name");
        let name = r.name("name", name);
        let account_type = r.patch("type");
        r.finish()?;
        Ok(Self { name, account_type })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

impl Payload for CategoryDraft {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let name = r.required("name");
        let name = r.name("name", name);
        let kind = r.optional("kind").unwrap_or_default();
        r.finish()?;
        Ok(Self {
            name: name.unwrap_or_default(),
            kind,
        })
    }
}

impl Payload for CategoryPatch {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let name = r.patch("name");
        let name = r.name("name", name);
        let kind = r.patch("kind");
        r.finish()?;
        Ok(Self { name, kind })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount_cents: i64,
    pub occurred_at: NaiveDate,
    pub category: Option<i64>,
    pub account: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount_cents: Option<i64>,
    pub occurred_at: Option<NaiveDate>,
    pub category: Option<Option<i64>>,
    pub account: Option<Option<i64>>,
}

impl Payload for TransactionDraft {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let description = r.optional("description");
        let description = r.description(description);
        let amount = r.required("amount");
        let amount_cents = r.money("amount", amount);
        let occurred_at = r.required("occurred_at");
        let category = r.optional("category");
        let account = r.optional("account");
        r.finish()?;
        match (amount_cents, occurred_at) {
            (Some(amount_cents), Some(occurred_at)) => Ok(Self {
                description: description.unwrap_or_default(),
                amount_cents,
                occurred_at,
                category,
                account,
            }),
            _ => Err(LedgerError::invalid("non_field_errors", "Incomplete transaction.")),
        }
    }
}

impl Payload for TransactionPatch {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let description = r.nullable::<String>("description");
        let description = description.map(|d| r.description(Some(d.unwrap_or_default())));
        let amount = r.patch("amount");
        let amount_cents = r.money("amount", amount);
        let occurred_at = r.patch("occurred_at");
        let category = r.nullable("category");
        let account = r.nullable("account");
        r.finish()?;
        Ok(Self {
            description: description.flatten(),
            amount_cents,
            occurred_at,
            category,
            account,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub category: i64,
    pub month: NaiveDate,
    pub limit_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    pub category: Option<i64>,
    pub month: Option<NaiveDate>,
    pub limit_cents: Option<i64>,
}

impl BudgetDraft {
    pub fn from_json_at(value: &Value, today: NaiveDate) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let category = r.required("category");
        let month = MonthInput::from_json(r.raw("month")).normalize(today);
        let limit = r.required("limit");
        let limit_cents = r.money("limit", limit);
        r.finish()?;
        match (category, limit_cents) {
            (Some(category), Some(limit_cents)) => Ok(Self {
                category,
                month,
                limit_cents,
            }),
            _ => Err(LedgerError::invalid("non_field_errors", "Incomplete budget.")),
        }
    }
}

impl Payload for BudgetDraft {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        Self::from_json_at(value, month::today())
    }
}

impl BudgetPatch {
    /// A missing or `null` month keeps the stored one.
    pub fn from_json_at(value: &Value, today: NaiveDate) -> Result<Self, LedgerError> {
        let mut r = PayloadReader::new(value)?;
        let category = r.patch("category");
        let month = match r.raw("month") {
            None | Some(Value::Null) => None,
            raw => Some(MonthInput::from_json(raw).normalize(today)),
        };
        let limit = r.patch("limit");
        let limit_cents = r.money("limit", limit);
        r.finish()?;
        Ok(Self {
            category,
            month,
            limit_cents,
        })
    }
}

impl Payload for BudgetPatch {
    fn from_json(value: &Value) -> Result<Self, LedgerError> {
        Self::from_json_at(value, month::today())
    }
}
