use sqlx::QueryBuilder;
use tracing::debug;

use super::{OwnedRepository, delete_owned, push_ordering, push_search};
use crate::db::models::OwnerId;
use crate::db::sqlite::{SqlitePool, conflict_as};
use crate::error::LedgerError;
use crate::filter::ListQuery;
use crate::types::entities::Category;
use crate::types::payload::{CategoryDraft, CategoryPatch};

const SEARCH_COLUMNS: &[(&str, &str)] = &[("name", "name"), ("kind", "kind")];
const ORDER_COLUMNS: &[(&str, &str)] = &[("id", "id")];
const DUPLICATE_NAME: &str = "a category with this name already exists";

#[derive(Clone)]
pub struct CategoryRepo {
    pool: SqlitePool,
}

impl CategoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl OwnedRepository for CategoryRepo {
    type Entity = Category;
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
    type Filter = ();

    async fn list(&self, owner: OwnerId, query: &ListQuery<()>) -> Result<Vec<Category>, LedgerError> {
        let mut qb = QueryBuilder::new("SELECT id, name, kind FROM categories WHERE user_id = ");
        qb.push_bind(owner);
        push_search(&mut qb, query, SEARCH_COLUMNS);
        push_ordering(&mut qb, &query.ordering, ORDER_COLUMNS, "name ASC, id ASC");
        let rows = qb.build_query_as::<Category>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get(&self, owner: OwnerId, id: i64) -> Result<Category, LedgerError> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, kind FROM categories WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, owner: OwnerId, draft: CategoryDraft) -> Result<Category, LedgerError> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (user_id, name, kind) VALUES (?, ?, ?) RETURNING id, name, kind",
        )
        .bind(owner)
        .bind(draft.name)
        .bind(draft.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_as(e, DUPLICATE_NAME))?;
        debug!(owner = %owner, id = row.id, "category created");
        Ok(row)
    }

    async fn update(&self, owner: OwnerId, id: i64, patch: CategoryPatch) -> Result<Category, LedgerError> {
        let current = self.get(owner, id).await?;
        let row = sqlx::query_as::<_, Category>(
            r#"UPDATE categories SET name = ?, kind = ?
               WHERE id = ? AND user_id = ?
               RETURNING id, name, kind"#,
        )
        .bind(patch.name.unwrap_or(current.name))
        .bind(patch.kind.unwrap_or(current.kind))
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_as(e, DUPLICATE_NAME))?;
        Ok(row)
    }

    /// Transactions keep their rows with the category cleared; budgets go with it.
    async fn delete(&self, owner: OwnerId, id: i64) -> Result<(), LedgerError> {
        delete_owned(&self.pool, "categories", owner, id).await
    }
}
