//! Owner-scoped repositories.
//!
//! Every operation takes the caller's [`OwnerId`] and every statement is
//! conjoined with `user_id = owner`. A row owned by someone else is
//! indistinguishable from a missing row: both are [`LedgerError::NotFound`].

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod transactions;

use std::future::Future;

use sqlx::{QueryBuilder, Sqlite};

use crate::db::models::OwnerId;
use crate::db::sqlite::SqlitePool;
use crate::error::LedgerError;
use crate::filter::{FilterSet, ListQuery, OrderBy, like_pattern};

pub use accounts::AccountRepo;
pub use budgets::BudgetRepo;
pub use categories::CategoryRepo;
pub use transactions::TransactionRepo;

pub trait OwnedRepository: Clone + Send + Sync + 'static {
    type Entity: serde::Serialize + Send;
    type Draft: Send;
    type Patch: Send;
    type Filter: FilterSet + Send + Sync;

    fn list(
        &self,
        owner: OwnerId,
        query: &ListQuery<Self::Filter>,
    ) -> impl Future<Output = Result<Vec<Self::Entity>, LedgerError>> + Send;

    fn get(
        &self,
        owner: OwnerId,
        id: i64,
    ) -> impl Future<Output = Result<Self::Entity, LedgerError>> + Send;

    /// Insert stamped with `owner`.
    fn create(
        &self,
        owner: OwnerId,
        draft: Self::Draft,
    ) -> impl Future<Output = Result<Self::Entity, LedgerError>> + Send;

    /// Apply the fields present in `patch`; the owner never changes.
    fn update(
        &self,
        owner: OwnerId,
        id: i64,
        patch: Self::Patch,
    ) -> impl Future<Output = Result<Self::Entity, LedgerError>> + Send;

    fn delete(
        &self,
        owner: OwnerId,
        id: i64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// Delete `id` from `table` if `owner` holds it.
pub(crate) async fn delete_owned(
    pool: &SqlitePool,
    table: &str,
    owner: OwnerId,
    id: i64,
) -> Result<(), LedgerError> {
    let sql = format!("DELETE FROM {table} WHERE id = ? AND user_id = ?");
    let res = sqlx::query(&sql).bind(id).bind(owner).execute(pool).await?;
    if res.rows_affected() == 0 {
        return Err(LedgerError::NotFound);
    }
    Ok(())
}

/// A reference to another owned row (`category`, `account`) must belong to `owner`.
/// Foreign rows are reported as not existing.
pub(crate) async fn ensure_owned_ref(
    pool: &SqlitePool,
    table: &str,
    field: &str,
    owner: OwnerId,
    id: i64,
) -> Result<(), LedgerError> {
    let sql = format!("SELECT 1 FROM {table} WHERE id = ? AND user_id = ?");
    let found: Option<(i64,)> = sqlx::query_as(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(LedgerError::invalid(
            field,
            format!("Invalid pk \"{id}\" - object does not exist."),
        )),
    }
}

/// ` AND (col LIKE ? OR ...)` per search term over the searchable columns.
/// `columns` maps API field name -> SQL expression.
pub(crate) fn push_search<F>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    query: &ListQuery<F>,
    columns: &[(&str, &str)],
) {
    let exprs: Vec<&str> = columns
        .iter()
        .filter(|(field, _)| query.search_fields.iter().any(|f| f == field))
        .map(|(_, expr)| *expr)
        .collect();
    if exprs.is_empty() {
        return;
    }
    for term in &query.search {
        let pattern = like_pattern(term);
        qb.push(" AND (");
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{expr} LIKE "));
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
}

/// ` ORDER BY ...`: the requested keys (mapped through `columns`) or `default`.
pub(crate) fn push_ordering(
    qb: &mut QueryBuilder<'_, Sqlite>,
    ordering: &[OrderBy],
    columns: &[(&str, &str)],
    default: &str,
) {
    let keys: Vec<String> = ordering
        .iter()
        .filter_map(|o| {
            columns
                .iter()
                .find(|(field, _)| *field == o.field)
                .map(|(_, expr)| format!("{expr} {}", if o.descending { "DESC" } else { "ASC" }))
        })
        .collect();
    qb.push(" ORDER BY ");
    if keys.is_empty() {
        qb.push(default);
    } else {
        qb.push(keys.join(", "));
    }
}
