//! Identity lookup: bearer token -> owner id.

use crate::db::models::{DbUser, OwnerId};
use crate::db::sqlite::SqlitePool;
use crate::error::LedgerError;
use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

fn token_hash(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert by unique username. Returns the user's id.
    /// Re-seeding an existing user rotates its token.
    pub async fn ensure_user(&self, username: &str, token: &str) -> Result<OwnerId, LedgerError> {
        let rec: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, token_hash) VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET token_hash = excluded.token_hash
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(token_hash(token))
        .fetch_one(&self.pool)
        .await?;
        Ok(OwnerId(rec.0))
    }

    pub async fn resolve_token(&self, token: &str) -> Result<Option<OwnerId>, LedgerError> {
        let rec: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE token_hash = ?")
            .bind(token_hash(token))
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.map(|r| OwnerId(r.0)))
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<DbUser>, LedgerError> {
        let user = sqlx::query_as::<_, DbUser>("SELECT id, username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Delete a user; every row it owns goes with it.
    pub async fn remove_user(&self, username: &str) -> Result<bool, LedgerError> {
        let res = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
