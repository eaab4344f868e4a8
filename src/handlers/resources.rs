//! CRUD handlers shared by every owned resource.

use axum::{
    Json,
    extract::{
        FromRef, Path, RawQuery, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

use crate::config::{AccessConfig, ResourcePolicy};
use crate::error::LedgerError;
use crate::filter::ListQuery;
use crate::middleware::auth::AuthUser;
use crate::repo::{AccountRepo, BudgetRepo, CategoryRepo, OwnedRepository, TransactionRepo};
use crate::router::LedgerState;
use crate::types::payload::Payload;

/// An owned repository exposed over HTTP.
pub trait Resource:
    OwnedRepository<Draft: Payload, Patch: Payload> + FromRef<LedgerState>
{
    /// Path segment under the API prefix.
    const PATH: &'static str;

    fn policy(access: &AccessConfig) -> &ResourcePolicy;
}

impl Resource for AccountRepo {
    const PATH: &'static str = "accounts";

    fn policy(access: &AccessConfig) -> &ResourcePolicy {
        &access.accounts
    }
}

impl Resource for CategoryRepo {
    const PATH: &'static str = "categories";

    fn policy(access: &AccessConfig) -> &ResourcePolicy {
        &access.categories
    }
}

impl Resource for TransactionRepo {
    const PATH: &'static str = "transactions";

    fn policy(access: &AccessConfig) -> &ResourcePolicy {
        &access.transactions
    }
}

impl Resource for BudgetRepo {
    const PATH: &'static str = "budgets";

    fn policy(access: &AccessConfig) -> &ResourcePolicy {
        &access.budgets
    }
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, LedgerError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| LedgerError::invalid("non_field_errors", rejection.body_text()))
}

/// Ids that do not parse can never match a row.
fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, LedgerError> {
    id.map(|Path(id)| id).map_err(|_| LedgerError::NotFound)
}

pub async fn list<R: Resource>(
    State(state): State<LedgerState>,
    AuthUser(owner): AuthUser,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<R::Entity>>, LedgerError> {
    let query = ListQuery::<R::Filter>::parse(query.as_deref(), R::policy(&state.access))?;
    let rows = R::from_ref(&state).list(owner, &query).await?;
    Ok(Json(rows))
}

pub async fn retrieve<R: Resource>(
    State(state): State<LedgerState>,
    AuthUser(owner): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<R::Entity>, LedgerError> {
    let id = path_id(id)?;
    let row = R::from_ref(&state).get(owner, id).await?;
    Ok(Json(row))
}

pub async fn create<R: Resource>(
    State(state): State<LedgerState>,
    AuthUser(owner): AuthUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<R::Entity>), LedgerError> {
    let draft = <R::Draft as Payload>::from_json(&json_body(body)?)?;
    let row = R::from_ref(&state).create(owner, draft).await?;
    info!(owner = %owner, resource = R::PATH, "created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update<R: Resource>(
    State(state): State<LedgerState>,
    AuthUser(owner): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R::Entity>, LedgerError> {
    let id = path_id(id)?;
    let patch = <R::Patch as Payload>::from_json(&json_body(body)?)?;
    let row = R::from_ref(&state).update(owner, id, patch).await?;
    info!(owner = %owner, resource = R::PATH, id, "updated");
    Ok(Json(row))
}

pub async fn destroy<R: Resource>(
    State(state): State<LedgerState>,
    AuthUser(owner): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, LedgerError> {
    let id = path_id(id)?;
    R::from_ref(&state).delete(owner, id).await?;
    info!(owner = %owner, resource = R::PATH, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}
