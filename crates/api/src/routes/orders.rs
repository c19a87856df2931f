//! Order endpoints: placement with event publishing, reads and status updates.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId};
use domain::{Money, Order, OrderCreatedEvent, OrderItem, OrderStatus};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub item_id: String,
    pub quantity: u32,
    pub price: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// -- Handlers --

/// POST /orders: place a pending order and publish its order-created event.
///
/// A publish failure is logged and the order is still returned as created;
/// the saga will then never run for it.
#[tracing::instrument(skip(state, body))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(req) = body?;

    let items = req
        .items
        .into_iter()
        .map(|item| OrderItem::new(item.item_id, item.quantity, Money::from_cents(item.price)))
        .collect();
    let order = state
        .orders
        .place_order(CustomerId::new(req.customer_id), items)
        .await?;

    let event = OrderCreatedEvent::from(&order);
    if let Err(e) = state.producer.publish(event.key(), &event).await {
        tracing::error!(order_id = %order.id, error = %e, "failed to publish order event");
    }

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders: all orders, newest first.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /orders/{id}: one order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .orders
        .get_order(&OrderId::new(id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {id}")))
}

/// PATCH /orders/{id}/status: overwrite the status of an order.
#[tracing::instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let Json(req) = body?;
    let order = state
        .orders
        .update_status(&OrderId::new(id), req.status)
        .await?;
    Ok(Json(order))
}
