//! Order service providing the order status authority's operations.

use common::{CustomerId, OrderId};

use super::{Order, OrderItem, OrderRepository, OrderStatus};
use crate::error::DomainError;

impl From<super::OrderError> for DomainError {
    fn from(e: super::OrderError) -> Self {
        DomainError::Order(e)
    }
}

/// Service for managing orders.
///
/// Wraps an [`OrderRepository`] with validation and logging.
#[derive(Debug, Clone)]
pub struct OrderService<R: OrderRepository> {
    repository: R,
}

impl<R: OrderRepository> OrderService<R> {
    /// Creates a new order service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Places and stores a new pending order.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
    ) -> Result<Order, DomainError> {
        let order = Order::place(customer_id, items)?;
        self.repository.create(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, customer_id = %order.customer_id, "order created");

        Ok(order)
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        self.repository.get(id).await
    }

    /// Lists all orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.repository.list().await
    }

    /// Sets the status of an order, failing if the order does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let order = self
            .repository
            .update_status(id, status)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(id.clone()))?;

        tracing::info!(order_id = %order.id, status = %order.status, "order status updated");
        Ok(order)
    }
}
