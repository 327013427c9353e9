//! HTTP adapter for payment provider webhooks.
//!
//! - `POST /api/webhooks/whop` - Apply a Whop membership event
//! - `GET /api/webhooks/whop` - Health check

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::WebhookAppState;
pub use routes::{webhook_router, webhook_routes};
