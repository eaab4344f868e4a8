//! Monthly summary: per-category totals for a month, per-month totals over
//! all time, and budget-vs-actual for the month's budgets.
//!
//! Sums run over integer cents in SQL; the result is exact.

use chrono::NaiveDate;
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::debug;

use crate::db::models::{OwnerId, cents_to_decimal};
use crate::db::sqlite::SqlitePool;
use crate::error::LedgerError;
use crate::month::{month_bounds, month_key};
use crate::repo::BudgetRepo;
use crate::types::entities::Budget;
use crate::types::summary::{BudgetProgress, CategoryTotal, MonthTotal, MonthlySummary};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategorySum {
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MonthSum {
    pub month: String,
    pub total_cents: i64,
}

#[derive(Clone)]
pub struct SummaryEngine {
    pool: SqlitePool,
    budgets: BudgetRepo,
}

impl SummaryEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            budgets: BudgetRepo::new(pool.clone()),
            pool,
        }
    }

    pub async fn summarize(
        &self,
        owner: OwnerId,
        year: i32,
        month: u32,
    ) -> Result<MonthlySummary, LedgerError> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| LedgerError::invalid("month", "Enter a valid year and month."))?;

        let by_category = self.category_sums(owner, start, end).await?;
        let by_month = self.month_sums(owner).await?;
        let budgets = self.budgets.for_month(owner, start).await?;

        debug!(
            owner = %owner,
            month = %month_key(start),
            categories = by_category.len(),
            budgets = budgets.len(),
            "summary computed"
        );
        Ok(build_summary(by_category, by_month, budgets))
    }

    async fn category_sums(
        &self,
        owner: OwnerId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategorySum>, LedgerError> {
        let rows = sqlx::query_as::<_, CategorySum>(
            r#"SELECT t.category_id, c.name AS category_name,
                      SUM(t.amount_cents) AS total_cents
               FROM transactions t
               LEFT JOIN categories c ON c.id = t.category_id
               WHERE t.user_id = ? AND t.occurred_at >= ? AND t.occurred_at <= ?
               GROUP BY t.category_id, c.name"#,
        )
        .bind(owner)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn month_sums(&self, owner: OwnerId) -> Result<Vec<MonthSum>, LedgerError> {
        let rows = sqlx::query_as::<_, MonthSum>(
            r#"SELECT substr(occurred_at, 1, 7) AS month, SUM(amount_cents) AS total_cents
               FROM transactions
               WHERE user_id = ?
               GROUP BY month"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Reduce raw group sums into the response.
///
/// Categories sort by name with the uncategorized group last; months sort
/// chronologically. One progress entry per budget, with `spent` taken from the
/// same month's category sums (zero when nothing was spent).
pub fn build_summary(
    mut by_category: Vec<CategorySum>,
    mut by_month: Vec<MonthSum>,
    budgets: Vec<Budget>,
) -> MonthlySummary {
    by_category.sort_by(|a, b| {
        (a.category_name.is_none(), &a.category_name, a.category_id).cmp(&(
            b.category_name.is_none(),
            &b.category_name,
            b.category_id,
        ))
    });
    by_month.sort_by(|a, b| a.month.cmp(&b.month));

    let spent_by_category: HashMap<i64, i64> = by_category
        .iter()
        .filter_map(|row| row.category_id.map(|id| (id, row.total_cents)))
        .collect();

    let budget_progress = budgets
        .into_iter()
        .map(|b| {
            let spent = cents_to_decimal(spent_by_category.get(&b.category).copied().unwrap_or(0));
            BudgetProgress {
                category_id: b.category,
                category_name: b.category_name,
                limit: b.limit,
                spent,
                remaining: b.limit - spent,
            }
        })
        .collect();

    MonthlySummary {
        by_category: by_category
            .into_iter()
            .map(|row| CategoryTotal {
                category_id: row.category_id,
                category_name: row.category_name,
                total: cents_to_decimal(row.total_cents),
            })
            .collect(),
        by_month: by_month
            .into_iter()
            .map(|row| MonthTotal {
                month: row.month,
                total: cents_to_decimal(row.total_cents),
            })
            .collect(),
        budget_progress,
    }
}
