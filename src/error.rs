use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing or invalid credential")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(SqlxError),

    #[error("Config error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.push(field, message);
        LedgerError::Validation(errors)
    }
}

impl From<SqlxError> for LedgerError {
    fn from(e: SqlxError) -> Self {
        match &e {
            SqlxError::RowNotFound => LedgerError::NotFound,
            SqlxError::Database(db) if db.is_unique_violation() => {
                LedgerError::Conflict("a record with these values already exists".to_string())
            }
            _ => LedgerError::Database(e),
        }
    }
}

impl From<figment::Error> for LedgerError {
    fn from(e: figment::Error) -> Self {
        LedgerError::Config(Box::new(e))
    }
}

/// Field name -> messages, serialized as a JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<(), LedgerError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            LedgerError::NotFound => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", "No matching record was found."),
            ),
            LedgerError::Validation(fields) => {
                let mut body = ApiErrorBody::new("VALIDATION_ERROR", "Request validation failed.");
                body.fields = Some(fields);
                (StatusCode::BAD_REQUEST, body)
            }
            LedgerError::Conflict(msg) => (StatusCode::CONFLICT, ApiErrorBody::new("CONFLICT", msg)),
            LedgerError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new(
                    "UNAUTHORIZED",
                    "Authentication credentials were not provided or are invalid.",
                ),
            ),
            LedgerError::Database(_) | LedgerError::Config(_) | LedgerError::Io(_) => {
                error!(error = %self, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            fields: None,
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
