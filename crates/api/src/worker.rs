//! The fulfillment consume loop, wired to its collaborators over HTTP.

use std::future::Future;

use messaging::{Consumer, MessagingError};
use saga::{
    FulfillmentSaga, HttpInventoryService, HttpNotificationService, HttpOrderStatusService,
    build_client,
};

use crate::config::Config;
use crate::state::SharedLog;

/// Saga reaching inventory, orders and email through their HTTP APIs.
pub type HttpFulfillmentSaga =
    FulfillmentSaga<HttpInventoryService, HttpOrderStatusService, HttpNotificationService>;

/// Builds the saga with one shared client bounded by `CLIENT_TIMEOUT_MS`.
pub fn http_saga(config: &Config) -> reqwest::Result<HttpFulfillmentSaga> {
    let client = build_client(config.client_timeout)?;

    Ok(FulfillmentSaga::new(
        HttpInventoryService::new(client.clone(), &config.inventory_service_url),
        HttpOrderStatusService::new(client.clone(), &config.orders_service_url),
        HttpNotificationService::new(client, &config.email_service_url),
    ))
}

/// Runs the consume loop until `shutdown` resolves or a saga fails.
pub async fn run<F>(
    config: &Config,
    log: SharedLog,
    saga: &HttpFulfillmentSaga,
    shutdown: F,
) -> Result<(), MessagingError>
where
    F: Future<Output = ()>,
{
    tracing::info!(
        inventory = %config.inventory_service_url,
        orders = %config.orders_service_url,
        email = %config.email_service_url,
        "fulfillment worker starting"
    );

    Consumer::new(log, &config.order_topic, &config.consumer_group)
        .consume(saga, shutdown)
        .await
}
