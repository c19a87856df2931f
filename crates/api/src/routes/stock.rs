//! Inventory endpoints backed by the stock ledger.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::ItemId;
use domain::StockLevel;
use serde::Deserialize;
use stock_ledger::StockLedger;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// GET /stock: every stock level, ordered by item id.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StockLevel>>, ApiError> {
    Ok(Json(state.ledger.list().await?))
}

/// GET /stock/{item_id}: one stock level.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<StockLevel>, ApiError> {
    Ok(Json(state.ledger.get(&ItemId::new(item_id)).await?))
}

/// POST /stock/{item_id}/reserve: moves units from available to reserved.
#[tracing::instrument(skip(state, body))]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    body: Result<Json<QuantityRequest>, JsonRejection>,
) -> Result<Json<StockLevel>, ApiError> {
    let Json(req) = body?;
    Ok(Json(
        state
            .ledger
            .reserve(&ItemId::new(item_id), req.quantity)
            .await?,
    ))
}

/// POST /stock/{item_id}/release: moves reserved units back to available.
#[tracing::instrument(skip(state, body))]
pub async fn release(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
    body: Result<Json<QuantityRequest>, JsonRejection>,
) -> Result<Json<StockLevel>, ApiError> {
    let Json(req) = body?;
    Ok(Json(
        state
            .ledger
            .release(&ItemId::new(item_id), req.quantity)
            .await?,
    ))
}
