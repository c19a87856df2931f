//! The order record owned by the order status authority.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderItem, OrderStatus};

/// An order as stored by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    /// Sum of quantity × price over all items.
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Places a new pending order, assigning it a fresh ID.
    ///
    /// Rejects orders without items, with a zero quantity or a negative price,
    /// and orders whose total overflows.
    pub fn place(customer_id: CustomerId, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        if customer_id.as_str().is_empty() {
            return Err(OrderError::CustomerIdRequired);
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    item_id: item.item_id.to_string(),
                    quantity: item.quantity,
                });
            }
            if item.price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    item_id: item.item_id.to_string(),
                    price: item.price.cents(),
                });
            }
        }

        let total = items
            .iter()
            .try_fold(Money::zero(), |total, item| {
                total.checked_add(item.total_price()?)
            })
            .ok_or(OrderError::TotalOverflow)?;

        Ok(Self {
            id: OrderId::generate(),
            customer_id,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }

    /// Returns the number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
