//! Error handling for the inventory and sales platform
//!
//! Every error is returned as `{ "error": { "code", "message", "field" } }`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ledger::LedgerError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry on {field}: {message}")]
    DuplicateEntry { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        field: String,
        message: String,
        available: i32,
        requested: i32,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn duplicate(field: &str, message: impl Into<String>) -> Self {
        AppError::DuplicateEntry {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Field the error is attached to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::Validation { field, .. }
            | AppError::DuplicateEntry { field, .. }
            | AppError::InsufficientStock { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Convert a ledger rule violation on the `quantity` field
    pub fn from_ledger(error: LedgerError, insufficient_message: Option<&str>) -> Self {
        match error {
            LedgerError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                field: "quantity".to_string(),
                message: insufficient_message
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
                available,
                requested,
            },
            LedgerError::NonPositiveQuantity | LedgerError::Overflow => {
                AppError::validation("quantity", error.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        match shared::first_field_error(&errors) {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::validation("input", "Invalid input"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let (field, message) = rejected_field(&err.body_text());
                AppError::Validation { field, message }
            }
            JsonRejection::JsonSyntaxError(_) => {
                AppError::validation("body", "JSON parse error.")
            }
            JsonRejection::MissingJsonContentType(_) => {
                AppError::validation("body", "Expected an application/json request body.")
            }
            other => AppError::validation("body", other.body_text()),
        }
    }
}

/// Split a body deserialization failure into the offending field and a
/// client-facing message. The text looks like
/// `Failed to deserialize ...: quantity: invalid type: string "abc", expected i32 at line 1 column 17`.
fn rejected_field(text: &str) -> (String, String) {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, rest)| rest);

    match detail.split_once(": ") {
        Some((path, reason)) if is_field_path(path) => {
            (path.to_string(), mismatch_message(reason).to_string())
        }
        _ => ("body".to_string(), mismatch_message(detail).to_string()),
    }
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

fn mismatch_message(reason: &str) -> &'static str {
    if reason.contains("expected i32") || reason.contains("expected i64") {
        "A valid integer is required."
    } else if reason.to_ascii_lowercase().contains("decimal") {
        "A valid number is required."
    } else if reason.contains("expected a string") {
        "Not a valid string."
    } else {
        "Invalid value."
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::DuplicateEntry { field, message } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock { field, message, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
