//! Integration tests for the order lifecycle as seen by the order service.

use common::{CustomerId, OrderId};
use domain::{
    DomainError, InMemoryOrderRepository, Money, OrderCreatedEvent, OrderItem, OrderService,
    OrderStatus,
};

fn service() -> OrderService<InMemoryOrderRepository> {
    OrderService::new(InMemoryOrderRepository::new())
}

fn line_items() -> Vec<OrderItem> {
    vec![
        OrderItem::new("ITEM-001", 2, Money::from_cents(1000)),
        OrderItem::new("ITEM-002", 1, Money::from_cents(2500)),
    ]
}

#[tokio::test]
async fn test_placed_order_produces_matching_event() {
    let service = service();
    let order = service
        .place_order(CustomerId::new("test-customer-1"), line_items())
        .await
        .unwrap();

    let event = OrderCreatedEvent::for_order(&order);
    let payload = serde_json::to_vec(&event).unwrap();
    let parsed: OrderCreatedEvent = serde_json::from_slice(&payload).unwrap();

    assert_eq!(parsed, event);
    assert_eq!(parsed.order_id, order.id);
    assert_eq!(parsed.items.len(), 2);
}

#[tokio::test]
async fn test_confirm_then_ship() {
    let service = service();
    let order = service
        .place_order(CustomerId::new("test-customer-1"), line_items())
        .await
        .unwrap();

    let confirmed = service
        .update_status(&order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(!confirmed.status.is_terminal());

    let shipped = service
        .update_status(&order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert!(shipped.status.is_terminal());
    assert_eq!(shipped.total, order.total);
    assert_eq!(shipped.items, order.items);
}

#[tokio::test]
async fn test_cancel_pending_order() {
    let service = service();
    let order = service
        .place_order(CustomerId::new("test-customer-1"), line_items())
        .await
        .unwrap();

    let cancelled = service
        .update_status(&order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_status_update_for_unknown_order() {
    let service = service();
    let result = service
        .update_status(&OrderId::new("does-not-exist"), OrderStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(DomainError::OrderNotFound(id)) if id.as_str() == "does-not-exist"));
}

#[tokio::test]
async fn test_list_orders_returns_all() {
    let service = service();
    for i in 1..=3 {
        service
            .place_order(
                CustomerId::new("list-test-customer"),
                vec![OrderItem::new("ITEM-001", i, Money::from_cents(1000))],
            )
            .await
            .unwrap();
    }

    let orders = service.list_orders().await.unwrap();
    assert_eq!(orders.len(), 3);
    assert!(orders.iter().all(|o| o.status == OrderStatus::Pending));
}
