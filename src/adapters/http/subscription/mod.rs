//! HTTP adapter for subscription endpoints.
//!
//! - `GET /api/subscription/status` - Verification state for polling
//! - `POST /api/subscription/fix` - Repair an inconsistent activation
//! - `POST /api/admin/activations` - Manual activation
//! - `GET /api/admin/activations/:user_id` - Inspect records
//! - `POST /api/admin/activations/:user_id/rollback` - Reset to free plan

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::SubscriptionAppState;
pub use routes::{subscription_router, subscription_routes};
