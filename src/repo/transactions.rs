use sqlx::QueryBuilder;
use tracing::debug;

use super::{OwnedRepository, delete_owned, ensure_owned_ref, push_ordering, push_search};
use crate::db::models::{DbTransaction, OwnerId};
use crate::db::sqlite::SqlitePool;
use crate::error::LedgerError;
use crate::filter::{ListQuery, TransactionFilter};
use crate::types::entities::Transaction;
use crate::types::payload::{TransactionDraft, TransactionPatch};

const SELECT: &str = r#"
    SELECT t.id, t.description, t.amount_cents, t.occurred_at,
           t.category_id, c.name AS category_name,
           t.account_id, a.name AS account_name
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
    LEFT JOIN accounts a ON a.id = t.account_id
    WHERE t.user_id = "#;

const SEARCH_COLUMNS: &[(&str, &str)] = &[("description", "t.description")];
const ORDER_COLUMNS: &[(&str, &str)] = &[
    ("occurred_at", "t.occurred_at"),
    ("amount", "t.amount_cents"),
    ("id", "t.id"),
];
/// Most recent date first, then most recently created.
const DEFAULT_ORDER: &str = "t.occurred_at DESC, t.id DESC";

#[derive(Clone)]
pub struct TransactionRepo {
    pool: SqlitePool,
}

impl TransactionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn check_refs(
        &self,
        owner: OwnerId,
        category: Option<i64>,
        account: Option<i64>,
    ) -> Result<(), LedgerError> {
        if let Some(id) = category {
            ensure_owned_ref(&self.pool, "categories", "category", owner, id).await?;
        }
        if let Some(id) = account {
            ensure_owned_ref(&self.pool, "accounts", "account", owner, id).await?;
        }
        Ok(())
    }

    async fn fetch_row(&self, owner: OwnerId, id: i64) -> Result<DbTransaction, LedgerError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push_bind(owner).push(" AND t.id = ").push_bind(id);
        let row = qb.build_query_as::<DbTransaction>().fetch_one(&self.pool).await?;
        Ok(row)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, sqlx::Sqlite>, f: &TransactionFilter) {
    if let Some(category) = f.category {
        qb.push(" AND t.category_id = ").push_bind(category);
    }
    if let Some(account) = f.account {
        qb.push(" AND t.account_id = ").push_bind(account);
    }
    if let Some(from) = f.date_from {
        qb.push(" AND t.occurred_at >= ").push_bind(from);
    }
    if let Some(to) = f.date_to {
        qb.push(" AND t.occurred_at <= ").push_bind(to);
    }
    if let Some(min) = f.min_amount_cents {
        qb.push(" AND t.amount_cents >= ").push_bind(min);
    }
    if let Some(max) = f.max_amount_cents {
        qb.push(" AND t.amount_cents <= ").push_bind(max);
    }
}

impl OwnedRepository for TransactionRepo {
    type Entity = Transaction;
    type Draft = TransactionDraft;
    type Patch = TransactionPatch;
    type Filter = TransactionFilter;

    async fn list(
        &self,
        owner: OwnerId,
        query: &ListQuery<TransactionFilter>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push_bind(owner);
        push_filters(&mut qb, &query.filters);
        push_search(&mut qb, query, SEARCH_COLUMNS);
        push_ordering(&mut qb, &query.ordering, ORDER_COLUMNS, DEFAULT_ORDER);
        let rows = qb.build_query_as::<DbTransaction>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn get(&self, owner: OwnerId, id: i64) -> Result<Transaction, LedgerError> {
        Ok(self.fetch_row(owner, id).await?.into())
    }

    async fn create(&self, owner: OwnerId, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        self.check_refs(owner, draft.category, draft.account).await?;
        let rec: (i64,) = sqlx::query_as(
            r#"INSERT INTO transactions
               (user_id, account_id, category_id, description, amount_cents, occurred_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(owner)
        .bind(draft.account)
        .bind(draft.category)
        .bind(draft.description)
        .bind(draft.amount_cents)
        .bind(draft.occurred_at)
        .fetch_one(&self.pool)
        .await?;
        debug!(owner = %owner, id = rec.0, "transaction created");
        self.get(owner, rec.0).await
    }

    async fn update(
        &self,
        owner: OwnerId,
        id: i64,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        let current = self.fetch_row(owner, id).await?;
        let category = patch.category.unwrap_or(current.category_id);
        let account = patch.account.unwrap_or(current.account_id);
        self.check_refs(owner, category, account).await?;

        sqlx::query(
            r#"UPDATE transactions SET
                account_id = ?,
                category_id = ?,
                description = ?,
                amount_cents = ?,
                occurred_at = ?
              WHERE id = ? AND user_id = ?"#,
        )
        .bind(account)
        .bind(category)
        .bind(patch.description.unwrap_or(current.description))
        .bind(patch.amount_cents.unwrap_or(current.amount_cents))
        .bind(patch.occurred_at.unwrap_or(current.occurred_at))
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        self.get(owner, id).await
    }

    async fn delete(&self, owner: OwnerId, id: i64) -> Result<(), LedgerError> {
        delete_owned(&self.pool, "transactions", owner, id).await
    }
}
