//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and schema bootstrap
//! - `users.rs`: token -> user resolution

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod users;

pub use models::{AccountType, CategoryKind, OwnerId};
pub use schema::SQLITE_INIT;
pub use sqlite::{LedgerStorage, SqlitePool};
pub use users::UserDirectory;
