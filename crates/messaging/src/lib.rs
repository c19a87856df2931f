//! At-least-once, partitioned message log carrying domain events between
//! services.
//!
//! - [`MessageLog`] trait with in-memory and PostgreSQL backends
//! - [`Producer`] serializes events to JSON and propagates a W3C `traceparent`
//! - [`Consumer`] runs the fetch, handle, commit loop for a consumer group

pub mod carrier;
pub mod consumer;
pub mod error;
pub mod log;
pub mod memory;
pub mod message;
pub mod postgres;
pub mod producer;

pub use carrier::TRACEPARENT_HEADER;
pub use consumer::{Consumer, MessageHandler};
pub use error::{HandlerError, MessagingError, Result};
pub use log::{DEFAULT_PARTITIONS, MessageLog};
pub use memory::InMemoryMessageLog;
pub use message::{Headers, Message, partition_for};
pub use postgres::PostgresMessageLog;
pub use producer::Producer;
