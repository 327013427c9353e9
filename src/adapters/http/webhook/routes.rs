//! Axum router for the Whop webhook endpoint.
//!
//! Webhooks carry no user authentication; the body signature is checked
//! by the application handler.

use axum::{routing::get, Router};

use super::handlers::{receive_whop_webhook, whop_webhook_health, WebhookAppState};

/// # Routes
/// - `POST /whop` - Apply a membership event
/// - `GET /whop` - Health check, echoes `challenge`
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/whop", get(whop_webhook_health).post(receive_whop_webhook))
}

/// Webhook routes mounted under `/api/webhooks`.
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().nest("/api/webhooks", webhook_routes())
}
