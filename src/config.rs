//! Runtime configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - built-in defaults (`Config::default()`)
//! - optional `config.toml` in the working directory (or `LEDGER_CONFIG`)
//! - `LEDGER_*` environment variables, nested keys split on `__`
//!   (e.g. `LEDGER_BASIC__LISTEN_ADDR=0.0.0.0:9000`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub access: AccessConfig,
    pub users: Vec<UserSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub cors_origins: Vec<String>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/ledgerline.sqlite".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            cors_origins: vec![
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

/// A user provisioned at startup together with its bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSeed {
    pub username: String,
    pub token: String,
}

/// Access rules handed to the router state at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// When false, requests without any credential act as `anonymous_user`.
    pub require_auth: bool,
    pub anonymous_user: Option<String>,
    pub accounts: ResourcePolicy,
    pub categories: ResourcePolicy,
    pub transactions: ResourcePolicy,
    pub budgets: ResourcePolicy,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            anonymous_user: None,
            accounts: ResourcePolicy::new(&[], &["id"], &["name", "type"]),
            categories: ResourcePolicy::new(&[], &["id"], &["name", "kind"]),
            transactions: ResourcePolicy::new(
                &[
                    "category",
                    "account",
                    "date_from",
                    "date_to",
                    "min_amount",
                    "max_amount",
                ],
                &["occurred_at", "amount", "id"],
                &["description"],
            ),
            budgets: ResourcePolicy::new(&[], &["month", "limit", "id"], &["category_name"]),
        }
    }
}

/// Which list query parameters a resource honors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePolicy {
    pub filter_fields: Vec<String>,
    pub ordering_fields: Vec<String>,
    pub search_fields: Vec<String>,
}

impl ResourcePolicy {
    pub fn new(filters: &[&str], ordering: &[&str], search: &[&str]) -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            filter_fields: owned(filters),
            ordering_fields: owned(ordering),
            search_fields: owned(search),
        }
    }

    pub fn allows_filter(&self, name: &str) -> bool {
        self.filter_fields.iter().any(|f| f == name)
    }

    pub fn allows_ordering(&self, name: &str) -> bool {
        self.ordering_fields.iter().any(|f| f == name)
    }
}

impl Config {
    /// Merge defaults, the TOML file and the environment.
    pub fn load() -> Result<Self, LedgerError> {
        let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let cfg = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LEDGER_").split("__"))
            .extract()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transaction_policy_matches_recognized_filters() {
        let access = AccessConfig::default();
        assert!(access.require_auth);
        assert!(access.transactions.allows_filter("date_from"));
        assert!(access.transactions.allows_filter("max_amount"));
        assert!(!access.transactions.allows_filter("description"));
        assert!(access.transactions.allows_ordering("amount"));
        assert!(!access.accounts.allows_ordering("name"));
        assert_eq!(access.budgets.search_fields, vec!["category_name".to_string()]);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LEDGER_CONFIG", "missing.toml");
            jail.set_env("LEDGER_BASIC__LISTEN_ADDR", "127.0.0.1:9100");
            jail.set_env("LEDGER_ACCESS__REQUIRE_AUTH", "false");
            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.basic.listen_addr, "127.0.0.1:9100");
            assert!(!cfg.access.require_auth);
            assert_eq!(cfg.basic.loglevel, "info");
            Ok(())
        });
    }

    #[test]
    fn toml_file_seeds_users() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [[users]]
                username = "alice"
                token = "alice-token"
                "#,
            )?;
            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(cfg.users.len(), 1);
            assert_eq!(cfg.users[0].username, "alice");
            Ok(())
        });
    }
}
