//! Order storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use super::{Order, OrderStatus};
use crate::error::DomainError;

/// Storage for order records.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a newly placed order.
    async fn create(&self, order: &Order) -> Result<(), DomainError>;

    /// Loads an order by ID. Returns None if it does not exist.
    async fn get(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Lists all orders, newest first.
    async fn list(&self) -> Result<Vec<Order>, DomainError>;

    /// Overwrites the status of an order and returns the updated record.
    ///
    /// Returns None if the order does not exist.
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError>;
}

#[async_trait]
impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    async fn create(&self, order: &Order) -> Result<(), DomainError> {
        (**self).create(order).await
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        (**self).list().await
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        (**self).update_status(id, status).await
    }
}

/// In-memory order repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(DomainError::DuplicateOrder(order.id.clone()));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }
}
