//! Collaborator contracts the saga drives, with in-process and HTTP
//! implementations.

pub mod http;
pub mod inventory;
pub mod notification;
pub mod orders;

use common::ItemId;
use domain::DomainError;
use stock_ledger::LedgerError;
use thiserror::Error;

pub use http::{
    HttpInventoryService, HttpNotificationService, HttpOrderStatusService, build_client,
};
pub use inventory::{InventoryService, LedgerInventoryService};
pub use notification::{
    InMemoryNotificationService, Notification, NotificationKind, NotificationService,
};
pub use orders::{OrderStatusService, RepositoryOrderStatusService};

/// Errors returned by the saga's collaborators.
///
/// Business rejections and infrastructure failures share one type because
/// the saga treats them alike during reservation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced item or order does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fewer units are available than were requested.
    #[error("Insufficient stock for item {item_id}: requested {requested}")]
    InsufficientStock { item_id: ItemId, requested: i64 },

    /// Fewer units are reserved than were asked to be released.
    #[error("Insufficient reserved stock for item {item_id}: requested {requested}")]
    InsufficientReservedStock { item_id: ItemId, requested: i64 },

    /// The request was rejected as invalid.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// The remote service answered with a status the client does not expect.
    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The request did not complete within the client timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be delivered.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    /// Returns true for business rejections, false for infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_)
                | ServiceError::InsufficientStock { .. }
                | ServiceError::InsufficientReservedStock { .. }
                | ServiceError::Invalid(_)
        )
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientStock { item_id, requested } => {
                ServiceError::InsufficientStock { item_id, requested }
            }
            LedgerError::InsufficientReservedStock { item_id, requested } => {
                ServiceError::InsufficientReservedStock { item_id, requested }
            }
            LedgerError::NotFound(item_id) => ServiceError::NotFound(format!("item {item_id}")),
            e @ LedgerError::InvalidQuantity { .. } => ServiceError::Invalid(e.to_string()),
            e => ServiceError::Transport(e.to_string()),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::OrderNotFound(id) => ServiceError::NotFound(format!("order {id}")),
            e @ DomainError::Database(_) => ServiceError::Transport(e.to_string()),
            e => ServiceError::Invalid(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}
