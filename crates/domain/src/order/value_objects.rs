//! Value objects for the order domain.

use common::ItemId;
use serde::{Deserialize, Serialize};

/// Money amount in the minor currency unit (cents) to avoid floating point issues.
///
/// Serialized as a bare integer, which is how prices travel on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.0.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, or `None` if the product does not fit.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` if the sum does not fit.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// A line item of an order. Immutable once the order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The inventory item being ordered.
    pub item_id: ItemId,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit in the minor currency unit.
    pub price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(item_id: impl Into<ItemId>, quantity: u32, price: Money) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            price,
        }
    }

    /// Returns the total price for this item (quantity * price), or `None`
    /// on overflow.
    pub fn total_price(&self) -> Option<Money> {
        self.price.checked_multiply(self.quantity)
    }
}
