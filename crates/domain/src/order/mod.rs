//! Order record and related types.

mod events;
mod model;
mod postgres;
mod repository;
mod service;
mod state;
mod value_objects;

pub use events::OrderCreatedEvent;
pub use model::Order;
pub use postgres::PostgresOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
pub use state::OrderStatus;
pub use value_objects::{Money, OrderItem};

use thiserror::Error;

/// Errors raised when placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Customer ID is required.
    #[error("Customer ID is required")]
    CustomerIdRequired,

    /// Invalid quantity.
    #[error("Invalid quantity for {item_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { item_id: String, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for {item_id}: {price} (must not be negative)")]
    InvalidPrice { item_id: String, price: i64 },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Quantity × price, or the sum over the items, does not fit in the
    /// money representation.
    #[error("Order total is too large")]
    TotalOverflow,
}
