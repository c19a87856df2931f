//! HTTP clients for the inventory, order and email services.
//!
//! All three share one [`reqwest::Client`] whose timeout bounds every call;
//! a timed-out call surfaces as [`ServiceError::Timeout`]. Identifiers are
//! sent as percent-encoded path segments, so ids containing `/`, `?` or `#`
//! reach the right resource.

use std::time::Duration;

use async_trait::async_trait;
use common::{ItemId, OrderId};
use domain::{Order, OrderStatus, StockLevel};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;

use super::{
    InventoryService, Notification, NotificationService, OrderStatusService, ServiceError,
};

/// Builds the shared HTTP client with a per-request timeout.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

#[derive(Serialize)]
struct QuantityRequest {
    quantity: u32,
}

#[derive(Serialize)]
struct StatusRequest {
    status: OrderStatus,
}

async fn unexpected(response: Response) -> ServiceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ServiceError::UnexpectedStatus { status, body }
}

/// Appends `segments` to the path of `base_url`, encoding each one.
fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, ServiceError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ServiceError::Transport(format!("invalid service url {base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ServiceError::Transport(format!("service url {base_url} has no path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// The status code decides the outcome of a stock call; the level in the
/// body is only kept when it decodes.
async fn reported_level(response: Response) -> Option<StockLevel> {
    match response.json().await {
        Ok(level) => Some(level),
        Err(e) => {
            tracing::warn!(error = %e, "stock level in response body could not be decoded");
            None
        }
    }
}

/// Inventory service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpInventoryService {
    client: Client,
    base_url: String,
}

impl HttpInventoryService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InventoryService for HttpInventoryService {
    #[tracing::instrument(skip(self), fields(service = "inventory"))]
    async fn reserve(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> Result<Option<StockLevel>, ServiceError> {
        let url = endpoint(&self.base_url, &["stock", item_id.as_str(), "reserve"])?;
        let response = self
            .client
            .post(url)
            .json(&QuantityRequest { quantity })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(reported_level(response).await),
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound(format!("item {item_id}"))),
            StatusCode::CONFLICT => Err(ServiceError::InsufficientStock {
                item_id: item_id.clone(),
                requested: i64::from(quantity),
            }),
            StatusCode::BAD_REQUEST => Err(ServiceError::Invalid(
                response.text().await.unwrap_or_default(),
            )),
            _ => Err(unexpected(response).await),
        }
    }

    #[tracing::instrument(skip(self), fields(service = "inventory"))]
    async fn release(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> Result<Option<StockLevel>, ServiceError> {
        let url = endpoint(&self.base_url, &["stock", item_id.as_str(), "release"])?;
        let response = self
            .client
            .post(url)
            .json(&QuantityRequest { quantity })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(reported_level(response).await),
            _ => Err(unexpected(response).await),
        }
    }
}

/// Order status service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOrderStatusService {
    client: Client,
    base_url: String,
}

impl HttpOrderStatusService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderStatusService for HttpOrderStatusService {
    #[tracing::instrument(skip(self), fields(service = "orders"))]
    async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let url = endpoint(&self.base_url, &["orders", order_id.as_str(), "status"])?;
        let response = self
            .client
            .patch(url)
            .json(&StatusRequest { status })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound(format!("order {order_id}"))),
            _ => Err(unexpected(response).await),
        }
    }
}

/// Email service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotificationService {
    client: Client,
    base_url: String,
}

impl HttpNotificationService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    #[tracing::instrument(skip(self, notification), fields(service = "email", to = %notification.to))]
    async fn send(&self, notification: &Notification) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, &["send"])?)
            .json(notification)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            _ => Err(unexpected(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_to_base_path() {
        assert_eq!(
            endpoint("http://localhost:3000/", &["send"]).unwrap().as_str(),
            "http://localhost:3000/send"
        );
        assert_eq!(
            endpoint("http://localhost:3000", &["stock", "A", "reserve"])
                .unwrap()
                .as_str(),
            "http://localhost:3000/stock/A/reserve"
        );
        assert_eq!(
            endpoint("http://gateway/inventory/", &["stock", "A", "reserve"])
                .unwrap()
                .as_str(),
            "http://gateway/inventory/stock/A/reserve"
        );
    }

    #[test]
    fn test_endpoint_encodes_reserved_characters() {
        let url = endpoint("http://localhost:3000", &["stock", "SIZE/XL", "reserve"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/stock/SIZE%2FXL/reserve");

        let url = endpoint("http://localhost:3000", &["orders", "a?b#c", "status"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/orders/a%3Fb%23c/status");
    }

    #[test]
    fn test_invalid_base_url_is_a_transport_failure() {
        assert!(matches!(
            endpoint("not a url", &["send"]),
            Err(ServiceError::Transport(_))
        ));
        assert!(matches!(
            endpoint("mailto:ops@example.com", &["send"]),
            Err(ServiceError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_failure() {
        let client = build_client(Duration::from_millis(200)).unwrap();
        // Port 9 (discard) is essentially never served on loopback.
        let service = HttpNotificationService::new(client, "http://127.0.0.1:9");

        let result = service
            .send(&Notification {
                to: "a@example.com".into(),
                subject: "s".into(),
                body: "b".into(),
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Transport(_) | ServiceError::Timeout)
        ));
    }
}
