use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::db::models::{AccountType, CategoryKind};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
}

/// Amounts serialize as 2-place decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub occurred_at: NaiveDate,
    pub category: Option<i64>,
    pub category_name: Option<String>,
    pub account: Option<i64>,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: i64,
    pub category: i64,
    pub category_name: String,
    pub month: NaiveDate,
    pub limit: Decimal,
}
