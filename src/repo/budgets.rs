use chrono::NaiveDate;
use sqlx::QueryBuilder;
use tracing::debug;

use super::{OwnedRepository, delete_owned, ensure_owned_ref, push_ordering, push_search};
use crate::db::models::{DbBudget, OwnerId};
use crate::db::sqlite::{SqlitePool, conflict_as};
use crate::error::LedgerError;
use crate::filter::ListQuery;
use crate::month::first_of_month;
use crate::types::entities::Budget;
use crate::types::payload::{BudgetDraft, BudgetPatch};

const SELECT: &str = r#"
    SELECT b.id, b.category_id, c.name AS category_name, b.month, b.limit_cents
    FROM budgets b
    JOIN categories c ON c.id = b.category_id
    WHERE b.user_id = "#;

const SEARCH_COLUMNS: &[(&str, &str)] = &[("category_name", "c.name")];
const ORDER_COLUMNS: &[(&str, &str)] = &[
    ("month", "b.month"),
    ("limit", "b.limit_cents"),
    ("id", "b.id"),
];
const DUPLICATE_BUDGET: &str = "a budget for this category and month already exists";

#[derive(Clone)]
pub struct BudgetRepo {
    pool: SqlitePool,
}

impl BudgetRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, owner: OwnerId, id: i64) -> Result<DbBudget, LedgerError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push_bind(owner).push(" AND b.id = ").push_bind(id);
        let row = qb.build_query_as::<DbBudget>().fetch_one(&self.pool).await?;
        Ok(row)
    }

    /// Budgets of `owner` for the month starting at `month`.
    pub async fn for_month(&self, owner: OwnerId, month: NaiveDate) -> Result<Vec<Budget>, LedgerError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push_bind(owner)
            .push(" AND b.month = ")
            .push_bind(first_of_month(month))
            .push(" ORDER BY c.name ASC, b.id ASC");
        let rows = qb.build_query_as::<DbBudget>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Budget::from).collect())
    }
}

impl OwnedRepository for BudgetRepo {
    type Entity = Budget;
    type Draft = BudgetDraft;
    type Patch = BudgetPatch;
    type Filter = ();

    async fn list(&self, owner: OwnerId, query: &ListQuery<()>) -> Result<Vec<Budget>, LedgerError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push_bind(owner);
        push_search(&mut qb, query, SEARCH_COLUMNS);
        push_ordering(&mut qb, &query.ordering, ORDER_COLUMNS, "b.month DESC, b.id DESC");
        let rows = qb.build_query_as::<DbBudget>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Budget::from).collect())
    }

    async fn get(&self, owner: OwnerId, id: i64) -> Result<Budget, LedgerError> {
        Ok(self.fetch_row(owner, id).await?.into())
    }

    /// Duplicate (owner, category, month) is rejected by the table's unique
    /// constraint, not by a lookup beforehand.
    async fn create(&self, owner: OwnerId, draft: BudgetDraft) -> Result<Budget, LedgerError> {
        ensure_owned_ref(&self.pool, "categories", "category", owner, draft.category).await?;
        let month = first_of_month(draft.month);
        let rec: (i64,) = sqlx::query_as(
            r#"INSERT INTO budgets (user_id, category_id, month, limit_cents)
               VALUES (?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(owner)
        .bind(draft.category)
        .bind(month)
        .bind(draft.limit_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_as(e, DUPLICATE_BUDGET))?;
        debug!(owner = %owner, id = rec.0, month = %month, "budget created");
        self.get(owner, rec.0).await
    }

    async fn update(&self, owner: OwnerId, id: i64, patch: BudgetPatch) -> Result<Budget, LedgerError> {
        let current = self.fetch_row(owner, id).await?;
        let category = patch.category.unwrap_or(current.category_id);
        if patch.category.is_some() {
            ensure_owned_ref(&self.pool, "categories", "category", owner, category).await?;
        }
        let month = first_of_month(patch.month.unwrap_or(current.month));

        sqlx::query(
            r#"UPDATE budgets SET category_id = ?, month = ?, limit_cents = ?
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(category)
        .bind(month)
        .bind(patch.limit_cents.unwrap_or(current.limit_cents))
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_as(e, DUPLICATE_BUDGET))?;
        self.get(owner, id).await
    }

    async fn delete(&self, owner: OwnerId, id: i64) -> Result<(), LedgerError> {
        delete_owned(&self.pool, "budgets", owner, id).await
    }
}
