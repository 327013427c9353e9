//! Axum router for subscription and admin activation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    admin_activate, admin_inspect, admin_rollback, fix_subscription, get_subscription_status,
    SubscriptionAppState,
};

/// # Routes (caller identified by `X-User-Id`)
/// - `GET /status` - Verification and pending purchase state
/// - `POST /fix` - Repair an inconsistent activation
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/status", get(get_subscription_status))
        .route("/fix", post(fix_subscription))
}

/// # Routes (require `X-Admin-Key`)
/// - `POST /` - Manual activation
/// - `GET /:user_id` - Inspect records
/// - `POST /:user_id/rollback` - Reset to free plan
pub fn admin_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/", post(admin_activate))
        .route("/:user_id", get(admin_inspect))
        .route("/:user_id/rollback", post(admin_rollback))
}

/// Mounts `/api/subscription` and `/api/admin/activations`.
pub fn subscription_router() -> Router<SubscriptionAppState> {
    Router::new()
        .nest("/api/subscription", subscription_routes())
        .nest("/api/admin/activations", admin_routes())
}
