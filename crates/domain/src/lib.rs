//! Domain layer for order fulfillment.
//!
//! This crate provides the data model shared by the services:
//! - Orders, line items and the order status lifecycle
//! - The `OrderCreatedEvent` integration event
//! - Stock levels tracked by the stock ledger
//! - Order storage used by the order status authority, in memory or in
//!   PostgreSQL

pub mod error;
pub mod order;
pub mod stock;

pub use error::DomainError;
pub use order::{
    InMemoryOrderRepository, Money, Order, OrderCreatedEvent, OrderError, OrderItem,
    OrderRepository, OrderService, OrderStatus, PostgresOrderRepository,
};
pub use stock::StockLevel;
