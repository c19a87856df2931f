//! Inventory stock levels.

use common::ItemId;
use serde::{Deserialize, Serialize};

/// Per-item stock counters held by the stock ledger.
///
/// Reserving moves units from `available` to `reserved`; releasing moves them
/// back, so `available + reserved` is conserved across reserve/release pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub item_id: ItemId,
    pub available: i64,
    pub reserved: i64,
}

impl StockLevel {
    /// Creates a stock level with nothing reserved.
    pub fn new(item_id: impl Into<ItemId>, available: i64) -> Self {
        Self {
            item_id: item_id.into(),
            available,
            reserved: 0,
        }
    }

    /// Returns the total units on hand, reserved or not.
    pub fn on_hand(&self) -> i64 {
        self.available + self.reserved
    }

    /// Returns true if `quantity` units can be reserved right now.
    pub fn can_reserve(&self, quantity: i64) -> bool {
        self.available >= quantity
    }

    /// Returns true if `quantity` reserved units can be released.
    pub fn can_release(&self, quantity: i64) -> bool {
        self.reserved >= quantity
    }
}
