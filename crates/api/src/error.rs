//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use stock_ledger::LedgerError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Stock ledger error.
    Ledger(LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::NoItems
            | OrderError::CustomerIdRequired
            | OrderError::TotalOverflow => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::DuplicateOrder(_) => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Serialization(_) | DomainError::Database(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        LedgerError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        // Releasing more than is reserved is a caller bug, not a business outcome.
        LedgerError::InsufficientReservedStock { .. }
        | LedgerError::Database(_)
        | LedgerError::Migration(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}
