//! Fulfillment saga orchestrating reservation, compensation and finalization.

use async_trait::async_trait;
use domain::{OrderCreatedEvent, OrderStatus};
use messaging::{HandlerError, Message, MessageHandler};

use crate::error::{Result, SagaError};
use crate::order_fulfillment;
use crate::outcome::{
    CompensationReport, ReleaseFailure, ReservationFailure, ReservedItem, SagaOutcome,
};
use crate::services::{
    InventoryService, Notification, NotificationKind, NotificationService, OrderStatusService,
};

/// Orchestrates the fulfillment of one order-created event at a time.
///
/// Items are reserved one by one. If any reservation fails, whether rejected
/// or unreachable, the items reserved so far are released, the order is
/// cancelled and the customer is told. Otherwise the customer is told first
/// and the order is confirmed. Only the status update and the notification
/// can fail a saga; a failed release is logged and reported, never fatal.
///
/// The saga keeps no state between executions and has no idempotency guard:
/// handling the same event twice repeats every side effect.
pub struct FulfillmentSaga<I, O, N>
where
    I: InventoryService,
    O: OrderStatusService,
    N: NotificationService,
{
    inventory: I,
    orders: O,
    notifications: N,
}

impl<I, O, N> FulfillmentSaga<I, O, N>
where
    I: InventoryService,
    O: OrderStatusService,
    N: NotificationService,
{
    /// Creates a new fulfillment saga.
    pub fn new(inventory: I, orders: O, notifications: N) -> Self {
        Self {
            inventory,
            orders,
            notifications,
        }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    pub fn notifications(&self) -> &N {
        &self.notifications
    }

    /// Decodes a JSON order-created event and executes the saga for it.
    pub async fn handle(&self, payload: &[u8]) -> Result<SagaOutcome> {
        let event: OrderCreatedEvent = serde_json::from_slice(payload).inspect_err(|e| {
            metrics::counter!("saga_failed").increment(1);
            tracing::error!(
                step = order_fulfillment::STEP_PARSE_EVENT,
                error = %e,
                "malformed order event"
            );
        })?;
        self.execute(&event).await
    }

    /// Executes the saga for one order-created event.
    #[tracing::instrument(
        skip(self, event),
        fields(
            saga_type = order_fulfillment::SAGA_TYPE,
            order_id = %event.order_id,
            item_count = event.items.len()
        )
    )]
    pub async fn execute(&self, event: &OrderCreatedEvent) -> Result<SagaOutcome> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let result = match self.reserve_all(event).await {
            Ok(reserved) => self.confirm(event, reserved).await,
            Err(failure) => self.cancel(event, failure).await,
        };

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);

        match &result {
            Ok(outcome @ SagaOutcome::Confirmed { .. }) => {
                metrics::counter!("saga_confirmed").increment(1);
                tracing::info!(outcome = outcome.as_str(), duration, "saga completed");
            }
            Ok(outcome @ SagaOutcome::Cancelled { .. }) => {
                metrics::counter!("saga_cancelled").increment(1);
                tracing::info!(outcome = outcome.as_str(), duration, "saga completed");
            }
            Err(e) => {
                metrics::counter!("saga_failed").increment(1);
                tracing::error!(step = e.step(), error = %e, duration, "saga failed");
            }
        }

        result
    }

    /// Reserves every item in order, stopping at the first failure.
    async fn reserve_all(
        &self,
        event: &OrderCreatedEvent,
    ) -> std::result::Result<Vec<ReservedItem>, ReservationFailure> {
        let mut reserved = Vec::with_capacity(event.items.len());

        for item in &event.items {
            match self.inventory.reserve(&item.item_id, item.quantity).await {
                Ok(level) => {
                    tracing::debug!(
                        step = order_fulfillment::STEP_RESERVE_INVENTORY,
                        item_id = %item.item_id,
                        quantity = item.quantity,
                        available = level.map(|level| level.available),
                        "item reserved"
                    );
                    reserved.push(ReservedItem {
                        item_id: item.item_id.clone(),
                        quantity: item.quantity,
                    });
                }
                Err(reason) => {
                    tracing::warn!(
                        step = order_fulfillment::STEP_RESERVE_INVENTORY,
                        item_id = %item.item_id,
                        quantity = item.quantity,
                        rejected = reason.is_rejection(),
                        error = %reason,
                        "item reservation failed"
                    );
                    return Err(ReservationFailure {
                        reserved,
                        failed_item: item.item_id.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(reserved)
    }

    /// Releases every reserved item; each release is attempted independently.
    async fn compensate(&self, reserved: Vec<ReservedItem>) -> CompensationReport {
        let mut report = CompensationReport::default();

        for item in reserved {
            match self.inventory.release(&item.item_id, item.quantity).await {
                Ok(_) => {
                    tracing::info!(
                        step = order_fulfillment::STEP_RELEASE_INVENTORY,
                        item_id = %item.item_id,
                        quantity = item.quantity,
                        "reservation released"
                    );
                    report.released.push(item);
                }
                Err(reason) => {
                    metrics::counter!("saga_release_failures").increment(1);
                    tracing::error!(
                        step = order_fulfillment::STEP_RELEASE_INVENTORY,
                        item_id = %item.item_id,
                        quantity = item.quantity,
                        error = %reason,
                        "failed to release reservation"
                    );
                    report.failed.push(ReleaseFailure { item, reason });
                }
            }
        }

        report
    }

    async fn confirm(
        &self,
        event: &OrderCreatedEvent,
        reserved: Vec<ReservedItem>,
    ) -> Result<SagaOutcome> {
        self.notify(event, NotificationKind::Confirmation).await?;
        self.set_status(event, OrderStatus::Confirmed).await?;

        Ok(SagaOutcome::Confirmed {
            order_id: event.order_id.clone(),
            reserved,
        })
    }

    async fn cancel(
        &self,
        event: &OrderCreatedEvent,
        failure: ReservationFailure,
    ) -> Result<SagaOutcome> {
        let ReservationFailure {
            reserved,
            failed_item,
            reason,
        } = failure;

        let compensation = self.compensate(reserved).await;
        self.set_status(event, OrderStatus::Cancelled).await?;
        self.notify(event, NotificationKind::Cancellation).await?;

        Ok(SagaOutcome::Cancelled {
            order_id: event.order_id.clone(),
            failed_item,
            reason,
            compensation,
        })
    }

    async fn set_status(&self, event: &OrderCreatedEvent, status: OrderStatus) -> Result<()> {
        self.orders
            .update_status(&event.order_id, status)
            .await
            .map_err(|source| SagaError::StatusUpdate {
                order_id: event.order_id.clone(),
                status,
                source,
            })?;

        tracing::info!(
            step = order_fulfillment::STEP_UPDATE_STATUS,
            %status,
            "order status updated"
        );
        Ok(())
    }

    async fn notify(&self, event: &OrderCreatedEvent, kind: NotificationKind) -> Result<()> {
        let notification: Notification = match kind {
            NotificationKind::Confirmation => order_fulfillment::confirmation_email(event),
            NotificationKind::Cancellation => order_fulfillment::cancellation_email(event),
        };

        self.notifications
            .send(&notification)
            .await
            .map_err(|source| SagaError::Notification {
                order_id: event.order_id.clone(),
                kind,
                source,
            })?;

        tracing::info!(
            step = order_fulfillment::STEP_NOTIFY_CUSTOMER,
            %kind,
            to = %notification.to,
            "customer notified"
        );
        Ok(())
    }
}

#[async_trait]
impl<I, O, N> MessageHandler for FulfillmentSaga<I, O, N>
where
    I: InventoryService,
    O: OrderStatusService,
    N: NotificationService,
{
    async fn handle(&self, message: &Message) -> std::result::Result<(), HandlerError> {
        FulfillmentSaga::handle(self, &message.payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        InMemoryNotificationService, LedgerInventoryService, RepositoryOrderStatusService,
    };
    use common::{CustomerId, ItemId};
    use domain::{InMemoryOrderRepository, Money, OrderItem, OrderService};
    use stock_ledger::{InMemoryStockLedger, StockLedger};

    type TestSaga = FulfillmentSaga<
        LedgerInventoryService<InMemoryStockLedger>,
        RepositoryOrderStatusService<InMemoryOrderRepository>,
        InMemoryNotificationService,
    >;

    fn saga(stock: &[(&str, i64)]) -> TestSaga {
        FulfillmentSaga::new(
            LedgerInventoryService::new(InMemoryStockLedger::with_stock(stock.iter().copied())),
            RepositoryOrderStatusService::new(OrderService::new(InMemoryOrderRepository::new())),
            InMemoryNotificationService::new(),
        )
    }

    async fn place(saga: &TestSaga, items: &[(&str, u32)]) -> OrderCreatedEvent {
        let items = items
            .iter()
            .map(|(id, qty)| OrderItem::new(*id, *qty, Money::from_cents(1000)))
            .collect();
        let order = saga
            .orders()
            .orders()
            .place_order(CustomerId::new("customer-1"), items)
            .await
            .unwrap();
        OrderCreatedEvent::from(&order)
    }

    #[tokio::test]
    async fn test_reserve_all_accumulates_until_failure() {
        let saga = saga(&[("A", 10), ("B", 1), ("C", 10)]);
        let event = place(&saga, &[("A", 2), ("B", 5), ("C", 1)]).await;

        let failure = saga.reserve_all(&event).await.unwrap_err();
        assert_eq!(
            failure.reserved,
            vec![ReservedItem {
                item_id: ItemId::new("A"),
                quantity: 2
            }]
        );
        assert_eq!(failure.failed_item.as_str(), "B");

        // C was never attempted
        let c = saga.inventory().ledger().get(&ItemId::new("C")).await.unwrap();
        assert_eq!(c.reserved, 0);
    }

    #[tokio::test]
    async fn test_compensate_continues_past_failures() {
        let saga = saga(&[("A", 10)]);
        let reserved = vec![
            ReservedItem {
                item_id: ItemId::new("A"),
                quantity: 1,
            },
            ReservedItem {
                item_id: ItemId::new("UNKNOWN"),
                quantity: 1,
            },
            ReservedItem {
                item_id: ItemId::new("A"),
                quantity: 1,
            },
        ];
        saga.inventory()
            .reserve(&ItemId::new("A"), 2)
            .await
            .unwrap();

        let report = saga.compensate(reserved).await;
        assert_eq!(report.released.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item.item_id.as_str(), "UNKNOWN");
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_handle_via_message_handler() {
        let saga = saga(&[("A", 10)]);
        let event = place(&saga, &[("A", 1)]).await;
        let message = Message {
            topic: OrderCreatedEvent::TOPIC.to_string(),
            partition: 0,
            offset: 0,
            key: event.key().to_string(),
            payload: serde_json::to_vec(&event).unwrap(),
            headers: Default::default(),
            timestamp: event.timestamp,
        };

        MessageHandler::handle(&saga, &message).await.unwrap();
        assert_eq!(saga.notifications().sent_count().await, 1);
    }

    #[tokio::test]
    async fn test_handler_error_for_malformed_message() {
        let saga = saga(&[]);
        let message = Message {
            topic: OrderCreatedEvent::TOPIC.to_string(),
            partition: 0,
            offset: 0,
            key: "k".to_string(),
            payload: b"not json".to_vec(),
            headers: Default::default(),
            timestamp: chrono::Utc::now(),
        };

        assert!(MessageHandler::handle(&saga, &message).await.is_err());
    }
}
