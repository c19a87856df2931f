//! Integration tests for the order fulfillment saga.

use common::{CustomerId, ItemId, OrderId};
use domain::{
    InMemoryOrderRepository, Money, OrderCreatedEvent, OrderItem, OrderService, OrderStatus,
};
use messaging::{Consumer, InMemoryMessageLog, MessagingError, Producer};
use saga::{
    FulfillmentSaga, InMemoryNotificationService, LedgerInventoryService,
    RepositoryOrderStatusService, SagaError, SagaOutcome, ServiceError,
};
use stock_ledger::{InMemoryStockLedger, StockLedger};

type TestSaga = FulfillmentSaga<
    LedgerInventoryService<InMemoryStockLedger>,
    RepositoryOrderStatusService<InMemoryOrderRepository>,
    InMemoryNotificationService,
>;

struct TestHarness {
    saga: TestSaga,
    ledger: InMemoryStockLedger,
    inventory: LedgerInventoryService<InMemoryStockLedger>,
    order_status: RepositoryOrderStatusService<InMemoryOrderRepository>,
    order_service: OrderService<InMemoryOrderRepository>,
    notifications: InMemoryNotificationService,
}

impl TestHarness {
    fn new() -> Self {
        let ledger = InMemoryStockLedger::with_stock([("ITEM-001", 100), ("ITEM-002", 50)]);
        let inventory = LedgerInventoryService::new(ledger.clone());
        let order_service = OrderService::new(InMemoryOrderRepository::new());
        let order_status = RepositoryOrderStatusService::new(order_service.clone());
        let notifications = InMemoryNotificationService::new();

        let saga = FulfillmentSaga::new(
            inventory.clone(),
            order_status.clone(),
            notifications.clone(),
        );

        Self {
            saga,
            ledger,
            inventory,
            order_status,
            order_service,
            notifications,
        }
    }

    async fn place_order(&self, items: &[(&str, u32)]) -> OrderCreatedEvent {
        let items = items
            .iter()
            .map(|(id, qty)| OrderItem::new(*id, *qty, Money::from_cents(1999)))
            .collect();
        let order = self
            .order_service
            .place_order(CustomerId::new("customer-1"), items)
            .await
            .unwrap();
        OrderCreatedEvent::from(&order)
    }

    async fn status_of(&self, order_id: &OrderId) -> OrderStatus {
        self.order_service
            .get_order(order_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    async fn stock(&self, item: &str) -> (i64, i64) {
        let level = self.ledger.get(&ItemId::new(item)).await.unwrap();
        (level.available, level.reserved)
    }
}

#[tokio::test]
async fn test_happy_path_confirms_order() {
    let h = TestHarness::new();
    let event = h.place_order(&[("ITEM-001", 2), ("ITEM-002", 1)]).await;
    let payload = serde_json::to_vec(&event).unwrap();

    let outcome = h.saga.handle(&payload).await.unwrap();

    assert!(outcome.is_confirmed());
    assert_eq!(outcome.order_id(), &event.order_id);
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Confirmed);
    assert_eq!(h.stock("ITEM-001").await, (98, 2));
    assert_eq!(h.stock("ITEM-002").await, (49, 1));

    let sent = h.notifications.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains(event.order_id.as_str()));
    assert!(sent[0].subject.starts_with("Order Confirmation"));
    assert_eq!(sent[0].to, "customer-1@example.com");
    assert!(sent[0].body.contains("2 items"));
}

#[tokio::test]
async fn test_insufficient_stock_cancels_order() {
    let h = TestHarness::new();
    let event = h.place_order(&[("ITEM-002", 51)]).await;

    let outcome = h.saga.execute(&event).await.unwrap();

    match &outcome {
        SagaOutcome::Cancelled {
            failed_item,
            reason,
            compensation,
            ..
        } => {
            assert_eq!(failed_item.as_str(), "ITEM-002");
            assert!(matches!(reason, ServiceError::InsufficientStock { .. }));
            assert!(compensation.released.is_empty());
            assert!(compensation.is_complete());
        }
        other => panic!("expected cancellation, got {other:?}"),
    }

    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Cancelled);
    assert_eq!(h.stock("ITEM-002").await, (50, 0));

    let sent = h.notifications.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.starts_with("Order Cancelled"));
    assert!(sent[0].body.contains("reimbursed"));
}

#[tokio::test]
async fn test_partial_failure_rolls_back_earlier_reservations() {
    let h = TestHarness::new();
    let event = h.place_order(&[("ITEM-001", 5), ("ITEM-002", 9999)]).await;

    let outcome = h.saga.execute(&event).await.unwrap();

    let SagaOutcome::Cancelled { compensation, .. } = &outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert_eq!(compensation.released.len(), 1);
    assert_eq!(compensation.released[0].item_id.as_str(), "ITEM-001");
    assert_eq!(compensation.released[0].quantity, 5);

    // All-or-nothing: nothing stays reserved
    assert_eq!(h.stock("ITEM-001").await, (100, 0));
    assert_eq!(h.stock("ITEM-002").await, (50, 0));
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Cancelled);
    assert_eq!(h.notifications.sent_count().await, 1);
}

#[tokio::test]
async fn test_unknown_item_cancels_order() {
    let h = TestHarness::new();
    let event = h.place_order(&[("ITEM-001", 1), ("ITEM-404", 1)]).await;

    let outcome = h.saga.execute(&event).await.unwrap();

    let SagaOutcome::Cancelled { reason, .. } = &outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert!(matches!(reason, ServiceError::NotFound(_)));
    assert_eq!(h.stock("ITEM-001").await, (100, 0));
}

#[tokio::test]
async fn test_transport_failure_during_reservation_compensates() {
    let h = TestHarness::new();
    h.inventory.set_unreachable_on_reserve("ITEM-002");
    let event = h.place_order(&[("ITEM-001", 3), ("ITEM-002", 1)]).await;

    let outcome = h.saga.execute(&event).await.unwrap();

    let SagaOutcome::Cancelled { reason, .. } = &outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert!(matches!(reason, ServiceError::Transport(_)));
    assert_eq!(h.stock("ITEM-001").await, (100, 0));
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_release_failure_is_reported_not_fatal() {
    let h = TestHarness::new();
    h.inventory.set_fail_on_release(true);
    let event = h.place_order(&[("ITEM-001", 5), ("ITEM-002", 9999)]).await;

    let outcome = h.saga.execute(&event).await.unwrap();

    let SagaOutcome::Cancelled { compensation, .. } = &outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert!(compensation.released.is_empty());
    assert_eq!(compensation.failed.len(), 1);
    assert_eq!(compensation.failed[0].item.item_id.as_str(), "ITEM-001");

    // The order still reaches a terminal status and the customer is told
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Cancelled);
    assert_eq!(h.notifications.sent_count().await, 1);
    assert_eq!(h.stock("ITEM-001").await, (95, 5));
}

#[tokio::test]
async fn test_confirmation_failure_is_fatal_and_leaves_order_pending() {
    let h = TestHarness::new();
    h.notifications.set_fail_on_send(true);
    let event = h.place_order(&[("ITEM-001", 1)]).await;

    let err = h.saga.execute(&event).await.unwrap_err();

    assert!(matches!(err, SagaError::Notification { .. }));
    assert_eq!(err.step(), "notify_customer");
    assert_eq!(err.order_id(), Some(&event.order_id));
    // Notification precedes the status update on the happy path
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Pending);
    assert_eq!(h.stock("ITEM-001").await, (99, 1));
}

#[tokio::test]
async fn test_status_failure_on_happy_path_is_fatal() {
    let h = TestHarness::new();
    h.order_status.set_fail_on_update(true);
    let event = h.place_order(&[("ITEM-001", 1)]).await;

    let err = h.saga.execute(&event).await.unwrap_err();

    assert!(matches!(
        err,
        SagaError::StatusUpdate {
            status: OrderStatus::Confirmed,
            ..
        }
    ));
    assert_eq!(h.notifications.sent_count().await, 1);
}

#[tokio::test]
async fn test_status_failure_on_cancellation_is_fatal_after_release() {
    let h = TestHarness::new();
    h.order_status.set_fail_on_update(true);
    let event = h.place_order(&[("ITEM-001", 5), ("ITEM-002", 9999)]).await;

    let err = h.saga.execute(&event).await.unwrap_err();

    assert!(matches!(
        err,
        SagaError::StatusUpdate {
            status: OrderStatus::Cancelled,
            ..
        }
    ));
    // Compensation ran before the failing status update; no email went out
    assert_eq!(h.stock("ITEM-001").await, (100, 0));
    assert_eq!(h.notifications.sent_count().await, 0);
}

#[tokio::test]
async fn test_cancellation_notification_failure_is_fatal() {
    let h = TestHarness::new();
    h.notifications.set_fail_on_send(true);
    let event = h.place_order(&[("ITEM-002", 51)]).await;

    let err = h.saga.execute(&event).await.unwrap_err();

    assert!(matches!(err, SagaError::Notification { .. }));
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_malformed_payload_is_an_error() {
    let h = TestHarness::new();

    let err = h.saga.handle(b"{\"order_id\": 42").await.unwrap_err();

    assert!(matches!(err, SagaError::MalformedEvent(_)));
    assert_eq!(err.order_id(), None);
    assert_eq!(h.notifications.sent_count().await, 0);
}

#[tokio::test]
async fn test_redelivery_repeats_side_effects() {
    let h = TestHarness::new();
    let event = h.place_order(&[("ITEM-001", 10)]).await;
    let payload = serde_json::to_vec(&event).unwrap();

    h.saga.handle(&payload).await.unwrap();
    h.saga.handle(&payload).await.unwrap();

    // No deduplication: stock is reserved twice and two emails are sent
    assert_eq!(h.stock("ITEM-001").await, (80, 20));
    assert_eq!(h.notifications.sent_count().await, 2);
    assert_eq!(h.status_of(&event.order_id).await, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_independent_sagas_share_the_ledger() {
    let h = TestHarness::new();
    let first = h.place_order(&[("ITEM-002", 30)]).await;
    let second = h.place_order(&[("ITEM-002", 30)]).await;

    let first_outcome = h.saga.execute(&first).await.unwrap();
    let second_outcome = h.saga.execute(&second).await.unwrap();

    assert!(first_outcome.is_confirmed());
    assert!(!second_outcome.is_confirmed());
    assert_eq!(h.stock("ITEM-002").await, (20, 30));
    assert_eq!(h.status_of(&first.order_id).await, OrderStatus::Confirmed);
    assert_eq!(h.status_of(&second.order_id).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_consume_loop_drives_saga() {
    let h = TestHarness::new();
    let log = InMemoryMessageLog::new();
    let producer = Producer::new(log.clone(), OrderCreatedEvent::TOPIC);

    let ok = h.place_order(&[("ITEM-001", 1)]).await;
    let short = h.place_order(&[("ITEM-002", 500)]).await;
    producer.publish(ok.key(), &ok).await.unwrap();
    producer.publish(short.key(), &short).await.unwrap();

    let consumer = Consumer::new(log.clone(), OrderCreatedEvent::TOPIC, "notification-worker");
    consumer.consume_one(&h.saga).await.unwrap();
    consumer.consume_one(&h.saga).await.unwrap();

    assert_eq!(log.lag(OrderCreatedEvent::TOPIC, "notification-worker").await, 0);
    assert_eq!(h.status_of(&ok.order_id).await, OrderStatus::Confirmed);
    assert_eq!(h.status_of(&short.order_id).await, OrderStatus::Cancelled);
    assert_eq!(h.notifications.sent_count().await, 2);
}

#[tokio::test]
async fn test_consume_loop_stops_on_fatal_saga_error() {
    let h = TestHarness::new();
    h.notifications.set_fail_on_send(true);
    let log = InMemoryMessageLog::new();
    let producer = Producer::new(log.clone(), OrderCreatedEvent::TOPIC);

    let event = h.place_order(&[("ITEM-001", 1)]).await;
    producer.publish(event.key(), &event).await.unwrap();

    let consumer = Consumer::new(log.clone(), OrderCreatedEvent::TOPIC, "notification-worker");
    let result = consumer.consume(&h.saga, std::future::pending()).await;

    assert!(matches!(result, Err(MessagingError::Handler { .. })));
    // Left uncommitted for redelivery
    assert_eq!(log.lag(OrderCreatedEvent::TOPIC, "notification-worker").await, 1);
}
