//! Saga pattern implementation for order fulfillment.
//!
//! The order fulfillment saga consumes one order-created event at a time:
//! 1. Reserve stock for every line item, in order
//! 2. On any failure, release what was reserved, cancel the order and notify
//!    the customer of the cancellation
//! 3. Otherwise notify the customer of the confirmation and confirm the order
//!
//! Collaborators are reached through the [`InventoryService`],
//! [`OrderStatusService`] and [`NotificationService`] traits, with in-process
//! implementations for tests and HTTP clients for deployments.

pub mod coordinator;
pub mod error;
pub mod order_fulfillment;
pub mod outcome;
pub mod services;

pub use coordinator::FulfillmentSaga;
pub use error::{Result, SagaError};
pub use outcome::{
    CompensationReport, ReleaseFailure, ReservationFailure, ReservedItem, SagaOutcome,
};
pub use services::{
    HttpInventoryService, HttpNotificationService, HttpOrderStatusService,
    InMemoryNotificationService, InventoryService, LedgerInventoryService, Notification,
    NotificationKind, NotificationService, OrderStatusService, RepositoryOrderStatusService,
    ServiceError, build_client,
};
