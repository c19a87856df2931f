//! HTTP services and the fulfillment worker of the order platform.
//!
//! One router serves the inventory (`/stock`), order (`/orders`) and email
//! (`/send`) APIs alongside `/health` and `/metrics`. The worker consumes
//! order-created events and drives the fulfillment saga against those APIs
//! over HTTP, so each service can also run as a separate deployment.

pub mod backends;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use backends::{BackendError, Backends};
pub use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/stock", get(routes::stock::list))
        .route("/stock/{item_id}", get(routes::stock::get))
        .route("/stock/{item_id}/reserve", post(routes::stock::reserve))
        .route("/stock/{item_id}/release", post(routes::stock::release))
        .route(
            "/orders",
            post(routes::orders::create).get(routes::orders::list),
        )
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/status", patch(routes::orders::update_status))
        .route("/send", post(routes::email::send))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state on top of `backends`.
pub fn create_state(backends: &Backends, config: &Config) -> Arc<AppState> {
    Arc::new(AppState::new(
        backends.ledger.clone(),
        backends.orders.clone(),
        backends.log.clone(),
        &config.order_topic,
        config.email_latency,
    ))
}
