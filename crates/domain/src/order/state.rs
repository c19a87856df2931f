//! Order status.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// The fulfillment saga only ever drives these transitions:
/// ```text
/// Pending ──┬──► Confirmed ──► Shipped
///           └──► Cancelled
/// ```
/// `Shipped` belongs to the fulfillment process downstream of the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order was created and awaits stock reservation.
    #[default]
    Pending,

    /// All items were reserved and the customer was notified.
    Confirmed,

    /// Order left the warehouse.
    Shipped,

    /// Reservation failed; stock was released (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true while the saga has not yet decided the order's fate.
    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
