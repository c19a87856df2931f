//! Integration events emitted by the order service.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use super::{Order, OrderItem};

/// Fact published once an order has been stored.
///
/// Delivered at least once: consumers must expect the same event to arrive
/// more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub timestamp: DateTime<Utc>,
}

impl OrderCreatedEvent {
    /// The topic order-created events are published on.
    pub const TOPIC: &'static str = "order.created";

    /// Builds the event announcing a freshly placed order.
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            items: order.items.clone(),
            timestamp: order.created_at,
        }
    }

    /// Returns the partitioning key for this event.
    pub fn key(&self) -> &str {
        self.order_id.as_str()
    }
}

impl From<&Order> for OrderCreatedEvent {
    fn from(order: &Order) -> Self {
        Self::for_order(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Money;

    #[test]
    fn test_event_mirrors_order() {
        let order = Order::place(
            CustomerId::new("customer-1"),
            vec![OrderItem::new("ITEM-001", 2, Money::from_cents(1000))],
        )
        .unwrap();

        let event = OrderCreatedEvent::from(&order);
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.customer_id, order.customer_id);
        assert_eq!(event.items, order.items);
        assert_eq!(event.timestamp, order.created_at);
        assert_eq!(event.key(), order.id.as_str());
    }

    #[test]
    fn test_event_parses_wire_payload() {
        let payload = r#"{
            "order_id": "order-1",
            "customer_id": "customer-1",
            "items": [{"item_id": "ITEM-001", "quantity": 5, "price": 1000}],
            "timestamp": "2024-01-15T10:30:00Z"
        }"#;

        let event: OrderCreatedEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.order_id.as_str(), "order-1");
        assert_eq!(event.items.len(), 1);
        assert_eq!(event.items[0].quantity, 5);
        assert_eq!(event.items[0].price.cents(), 1000);
    }

    #[test]
    fn test_event_rejects_missing_fields() {
        let payload = r#"{"order_id": "order-1"}"#;
        assert!(serde_json::from_str::<OrderCreatedEvent>(payload).is_err());
    }
}
