pub mod config;
pub mod error;
pub mod db;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod month;
pub mod repo;
pub mod router;
pub mod service;
pub mod types;

pub use error::LedgerError;
pub use router::{LedgerState, ledger_router};
