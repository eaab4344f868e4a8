use axum::{
    Router,
    extract::FromRef,
    routing::get,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AccessConfig;
use crate::db::{LedgerStorage, UserDirectory};
use crate::handlers::resources::{self, Resource};
use crate::handlers::summary::monthly_summary;
use crate::repo::{AccountRepo, BudgetRepo, CategoryRepo, TransactionRepo};
use crate::service::summary::SummaryEngine;

pub const API_PREFIX: &str = "/api/finance";

#[derive(Clone)]
pub struct LedgerState {
    pub storage: LedgerStorage,
    pub users: UserDirectory,
    pub access: Arc<AccessConfig>,
}

impl LedgerState {
    pub fn new(storage: LedgerStorage, access: AccessConfig) -> Self {
        Self {
            users: UserDirectory::new(storage.pool().clone()),
            storage,
            access: Arc::new(access),
        }
    }
}

impl FromRef<LedgerState> for AccountRepo {
    fn from_ref(state: &LedgerState) -> Self {
        AccountRepo::new(state.storage.pool().clone())
    }
}

impl FromRef<LedgerState> for CategoryRepo {
    fn from_ref(state: &LedgerState) -> Self {
        CategoryRepo::new(state.storage.pool().clone())
    }
}

impl FromRef<LedgerState> for TransactionRepo {
    fn from_ref(state: &LedgerState) -> Self {
        TransactionRepo::new(state.storage.pool().clone())
    }
}

impl FromRef<LedgerState> for BudgetRepo {
    fn from_ref(state: &LedgerState) -> Self {
        BudgetRepo::new(state.storage.pool().clone())
    }
}

impl FromRef<LedgerState> for SummaryEngine {
    fn from_ref(state: &LedgerState) -> Self {
        SummaryEngine::new(state.storage.pool().clone())
    }
}

/// `<base>` list/create and `<base>/{id}` retrieve/update/delete.
fn resource_routes<R: Resource>(router: Router<LedgerState>) -> Router<LedgerState> {
    let base = format!("{API_PREFIX}/{}", R::PATH);
    router
        .route(
            &base,
            get(resources::list::<R>).post(resources::create::<R>),
        )
        .route(
            &format!("{base}/{{id}}"),
            get(resources::retrieve::<R>)
                .patch(resources::update::<R>)
                .delete(resources::destroy::<R>),
        )
}

pub fn ledger_router(state: LedgerState) -> Router {
    let router = Router::new();
    let router = resource_routes::<AccountRepo>(router);
    let router = resource_routes::<CategoryRepo>(router);
    let router = resource_routes::<TransactionRepo>(router);
    let router = resource_routes::<BudgetRepo>(router);
    router
        .route(&format!("{API_PREFIX}/summary"), get(monthly_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
