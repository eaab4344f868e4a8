//! SQL DDL for initializing the ledger database (SQLite).

/// SQLite schema with:
/// - `users`: token stored as SHA-256 hex, never in clear
/// - every owned table references `users(id)` with `ON DELETE CASCADE`
/// - `transactions` keeps the row when its account/category goes away (`SET NULL`)
/// - `budgets` go away with their category and are unique per (owner, category, month)
/// - money columns are integer cents
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    token_hash TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'CHECKING'
        CHECK (type IN ('CASH', 'CHECKING', 'SAVINGS', 'CREDIT', 'INVESTMENT'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'EXPENSE' CHECK (kind IN ('EXPENSE', 'INCOME')),
    UNIQUE (user_id, name)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id INTEGER NULL REFERENCES accounts(id) ON DELETE SET NULL,
    category_id INTEGER NULL REFERENCES categories(id) ON DELETE SET NULL,
    description TEXT NOT NULL DEFAULT '',
    amount_cents INTEGER NOT NULL,
    occurred_at TEXT NOT NULL -- YYYY-MM-DD
);

CREATE TABLE IF NOT EXISTS budgets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    month TEXT NOT NULL, -- always YYYY-MM-01
    limit_cents INTEGER NOT NULL,
    UNIQUE (user_id, category_id, month)
);

CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, occurred_at);
CREATE INDEX IF NOT EXISTS idx_budgets_user_month ON budgets(user_id, month)
"#;
