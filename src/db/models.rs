use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::entities::{Budget, Transaction};

/// Authenticated user id; every owned row carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct OwnerId(pub i64);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Cash,
    #[default]
    Checking,
    Savings,
    Credit,
    Investment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryKind {
    #[default]
    Expense,
    Income,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbTransaction {
    pub id: i64,
    pub description: String,
    pub amount_cents: i64,
    pub occurred_at: NaiveDate,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub account_id: Option<i64>,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbBudget {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub month: NaiveDate,
    pub limit_cents: i64,
}

/// Integer cents as a 2-place decimal.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Exact conversion; `None` when the value has more than 2 fractional digits
/// or does not fit in cents.
pub fn decimal_to_cents(value: Decimal) -> Option<i64> {
    if value.normalize().scale() > 2 {
        return None;
    }
    let mut scaled = value;
    scaled.rescale(2);
    i64::try_from(scaled.mantissa()).ok()
}

impl From<DbTransaction> for Transaction {
    fn from(d: DbTransaction) -> Self {
        Transaction {
            id: d.id,
            description: d.description,
            amount: cents_to_decimal(d.amount_cents),
            occurred_at: d.occurred_at,
            category: d.category_id,
            category_name: d.category_name,
            account: d.account_id,
            account_name: d.account_name,
        }
    }
}

impl From<DbBudget> for Budget {
    fn from(d: DbBudget) -> Self {
        Budget {
            id: d.id,
            category: d.category_id,
            category_name: d.category_name,
            month: d.month,
            limit: cents_to_decimal(d.limit_cents),
        }
    }
}
