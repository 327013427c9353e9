//! HTTP adapters - REST API implementations.
//!
//! Each module owns its routes, handlers, DTOs and app state. [`api_router`]
//! assembles them behind the shared tracing and timeout layers.

pub mod subscription;
pub mod webhook;

use std::time::Duration;

use axum::{routing::get, Json, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use subscription::{subscription_router, SubscriptionAppState};
pub use webhook::{webhook_router, WebhookAppState};

/// Complete application router.
pub fn api_router(
    webhook_state: WebhookAppState,
    subscription_state: SubscriptionAppState,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(webhook_router().with_state(webhook_state))
        .merge(subscription_router().with_state(subscription_state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
