use sqlx::QueryBuilder;
use tracing::debug;

use super::{OwnedRepository, delete_owned, push_ordering, push_search};
use crate::db::models::OwnerId;
use crate::db::sqlite::SqlitePool;
use crate::error::LedgerError;
use crate::filter::ListQuery;
use crate::types::entities::Account;
use crate::types::payload::{AccountDraft, AccountPatch};

const SEARCH_COLUMNS: &[(&str, &str)] = &[("name", "name"), ("type", "type")];
const ORDER_COLUMNS: &[(&str, &str)] = &[("id", "id")];

#[derive(Clone)]
pub struct AccountRepo {
    pool: SqlitePool,
}

impl AccountRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl OwnedRepository for AccountRepo {
    type Entity = Account;
    type Draft = AccountDraft;
    type Patch = AccountPatch;
    type Filter = ();

    async fn list(&self, owner: OwnerId, query: &ListQuery<()>) -> Result<Vec<Account>, LedgerError> {
        let mut qb = QueryBuilder::new("SELECT id, name, type FROM accounts WHERE user_id = ");
        qb.push_bind(owner);
        push_search(&mut qb, query, SEARCH_COLUMNS);
        push_ordering(&mut qb, &query.ordering, ORDER_COLUMNS, "id ASC");
        let rows = qb.build_query_as::<Account>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get(&self, owner: OwnerId, id: i64) -> Result<Account, LedgerError> {
        let row = sqlx::query_as::<_, Account>(
            "SELECT id, name, type FROM accounts WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, owner: OwnerId, draft: AccountDraft) -> Result<Account, LedgerError> {
        let row = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (user_id, name, type) VALUES (?, ?, ?) RETURNING id, name, type",
        )
        .bind(owner)
        .bind(draft.name)
        .bind(draft.account_type)
        .fetch_one(&self.pool)
        .await?;
        debug!(owner = %owner, id = row.id, "account created");
        Ok(row)
    }

    async fn update(&self, owner: OwnerId, id: i64, patch: AccountPatch) -> Result<Account, LedgerError> {
        let current = self.get(owner, id).await?;
        let row = sqlx::query_as::<_, Account>(
            r#"UPDATE accounts SET name = ?, type = ?
               WHERE id = ? AND user_id = ?
               RETURNING id, name, type"#,
        )
        .bind(patch.name.unwrap_or(current.name))
        .bind(patch.account_type.unwrap_or(current.account_type))
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner: OwnerId, id: i64) -> Result<(), LedgerError> {
        delete_owned(&self.pool, "accounts", owner, id).await
    }
}
