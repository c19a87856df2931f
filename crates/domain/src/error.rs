//! Domain error types.

use common::OrderId;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order failed validation.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with the same ID was already stored.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Order storage failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
