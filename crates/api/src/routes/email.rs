//! Email stub: accepts a message, waits a fixed latency and reports it sent.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use saga::Notification;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SendResponse {
    pub status: &'static str,
}

/// POST /send: simulate delivery of one email.
#[tracing::instrument(skip(state, body))]
pub async fn send(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Notification>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let Json(email) = body?;

    tokio::time::sleep(state.email_latency).await;

    metrics::counter!("emails_sent_total").increment(1);
    tracing::info!(to = %email.to, subject = %email.subject, "email sent");

    Ok(Json(SendResponse { status: "sent" }))
}
