//! Shared application state accessible from all handlers.

use std::sync::Arc;
use std::time::Duration;

use domain::{OrderRepository, OrderService};
use messaging::{MessageLog, Producer};
use stock_ledger::StockLedger;

/// Handle to the message log shared by the producer and the consume loop.
pub type SharedLog = Arc<dyn MessageLog>;

/// Handle to the stock ledger shared by the stock routes and the consume loop.
pub type SharedLedger = Arc<dyn StockLedger>;

/// Handle to the order store behind the order routes.
pub type SharedOrders = Arc<dyn OrderRepository>;

pub struct AppState {
    pub ledger: SharedLedger,
    pub orders: OrderService<SharedOrders>,
    pub producer: Producer<SharedLog>,
    pub email_latency: Duration,
}

impl AppState {
    /// Creates state over the given stores, publishing to `topic`.
    pub fn new(
        ledger: SharedLedger,
        orders: SharedOrders,
        log: SharedLog,
        topic: impl Into<String>,
        email_latency: Duration,
    ) -> Self {
        Self {
            ledger,
            orders: OrderService::new(orders),
            producer: Producer::new(log, topic),
            email_latency,
        }
    }
}
