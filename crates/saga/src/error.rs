//! Saga error types.

use common::OrderId;
use domain::OrderStatus;
use thiserror::Error;

use crate::services::{NotificationKind, ServiceError};

/// Errors that abort a saga execution.
///
/// Reservation failures never appear here: they are handled by compensation
/// and reported through [`SagaOutcome::Cancelled`](crate::SagaOutcome).
#[derive(Debug, Error)]
pub enum SagaError {
    /// The payload is not a valid order-created event.
    #[error("Malformed order event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// The order status could not be finalized.
    #[error("Failed to set order {order_id} to {status}: {source}")]
    StatusUpdate {
        order_id: OrderId,
        status: OrderStatus,
        #[source]
        source: ServiceError,
    },

    /// The customer notification could not be sent.
    #[error("Failed to send {kind} notification for order {order_id}: {source}")]
    Notification {
        order_id: OrderId,
        kind: NotificationKind,
        #[source]
        source: ServiceError,
    },
}

impl SagaError {
    /// Returns the saga step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            SagaError::MalformedEvent(_) => crate::order_fulfillment::STEP_PARSE_EVENT,
            SagaError::StatusUpdate { .. } => crate::order_fulfillment::STEP_UPDATE_STATUS,
            SagaError::Notification { .. } => crate::order_fulfillment::STEP_NOTIFY_CUSTOMER,
        }
    }

    /// Returns the order the failure belongs to, if the payload was readable.
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            SagaError::MalformedEvent(_) => None,
            SagaError::StatusUpdate { order_id, .. } | SagaError::Notification { order_id, .. } => {
                Some(order_id)
            }
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
