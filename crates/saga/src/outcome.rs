//! Results of a saga execution.

use common::{ItemId, OrderId};

use crate::services::ServiceError;

/// A line item whose stock the saga holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedItem {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Why reservation stopped, and what had been reserved up to that point.
#[derive(Debug)]
pub struct ReservationFailure {
    /// Items reserved before the failure, in order.
    pub reserved: Vec<ReservedItem>,
    pub failed_item: ItemId,
    pub reason: ServiceError,
}

/// A release that failed during compensation.
#[derive(Debug)]
pub struct ReleaseFailure {
    pub item: ReservedItem,
    pub reason: ServiceError,
}

/// What compensation managed to undo.
#[derive(Debug, Default)]
pub struct CompensationReport {
    pub released: Vec<ReservedItem>,
    pub failed: Vec<ReleaseFailure>,
}

impl CompensationReport {
    /// Returns true if every reserved item was released.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Terminal result of one saga execution.
#[derive(Debug)]
pub enum SagaOutcome {
    /// Every item was reserved; the order is confirmed and the customer notified.
    Confirmed {
        order_id: OrderId,
        reserved: Vec<ReservedItem>,
    },

    /// An item could not be reserved; earlier reservations were compensated,
    /// the order is cancelled and the customer notified.
    Cancelled {
        order_id: OrderId,
        failed_item: ItemId,
        reason: ServiceError,
        compensation: CompensationReport,
    },
}

impl SagaOutcome {
    pub fn order_id(&self) -> &OrderId {
        match self {
            SagaOutcome::Confirmed { order_id, .. } | SagaOutcome::Cancelled { order_id, .. } => {
                order_id
            }
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SagaOutcome::Confirmed { .. })
    }

    /// Returns the outcome name used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaOutcome::Confirmed { .. } => "confirmed",
            SagaOutcome::Cancelled { .. } => "cancelled",
        }
    }
}
