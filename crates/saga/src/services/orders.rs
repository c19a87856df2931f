//! Order status service trait and in-process implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderRepository, OrderService, OrderStatus};

use super::ServiceError;

/// Trait for the authority that owns order records.
#[async_trait]
pub trait OrderStatusService: Send + Sync {
    /// Sets an order's status, returning the updated order.
    async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError>;
}

/// Order status service backed by an [`OrderService`] in the same process.
#[derive(Clone)]
pub struct RepositoryOrderStatusService<R: OrderRepository> {
    orders: OrderService<R>,
    fail_on_update: Arc<AtomicBool>,
}

impl<R: OrderRepository> RepositoryOrderStatusService<R> {
    /// Creates a new order status service.
    pub fn new(orders: OrderService<R>) -> Self {
        Self {
            orders,
            fail_on_update: Arc::default(),
        }
    }

    /// Returns the wrapped order service.
    pub fn orders(&self) -> &OrderService<R> {
        &self.orders
    }

    /// Configures every status update to fail with a transport error.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.fail_on_update.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<R: OrderRepository> OrderStatusService for RepositoryOrderStatusService<R> {
    async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        if self.fail_on_update.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport(
                "order service unreachable".to_string(),
            ));
        }
        Ok(self.orders.update_status(order_id, status).await?)
    }
}
