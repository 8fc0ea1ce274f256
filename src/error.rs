//! Error types and HTTP error response handling.
//!
//! This module defines the errors a request can end with and how they are
//! converted into HTTP responses with appropriate status codes and JSON
//! bodies. Ledger errors carry only a kind; the wording clients see is
//! decided here.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::ledger::LedgerError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Ledger Errors**: Anything the coordinator rejected or failed at
/// - **Validation Errors**: Body or query string could not be decoded
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Coordinator operation failed.
    ///
    /// Wraps `LedgerError` using `#[from]`, so handlers can use `?` directly
    /// on coordinator results.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Request body or query string is malformed.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `UserNotFound`, `ReservationNotFound` → 404 Not Found
/// - `InsufficientFunds` → 422 Unprocessable Entity
/// - `InvalidAmount`, `SelfTransfer`, `InvalidRequest` → 400 Bad Request
/// - `Storage` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::Ledger(err) => {
                let status = match err {
                    LedgerError::UserNotFound => StatusCode::NOT_FOUND,
                    LedgerError::ReservationNotFound => StatusCode::NOT_FOUND,
                    LedgerError::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
                    LedgerError::InvalidAmount | LedgerError::SelfTransfer => {
                        StatusCode::BAD_REQUEST
                    }
                    LedgerError::Storage(ref detail) => {
                        tracing::error!(error = %detail, "storage failure while serving request");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let message = match err {
                    LedgerError::UserNotFound => "User not found".to_string(),
                    LedgerError::ReservationNotFound => "Reservation not found".to_string(),
                    LedgerError::InsufficientFunds => "Insufficient funds".to_string(),
                    LedgerError::InvalidAmount => "Amount must be positive".to_string(),
                    LedgerError::SelfTransfer => "Cannot transfer to the same user".to_string(),
                    LedgerError::Storage(_) => "An internal error occurred".to_string(),
                };
                (status, err.code(), message)
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
