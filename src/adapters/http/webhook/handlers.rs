//! HTTP handlers for the Whop webhook endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::handlers::webhook::{HandleWhopWebhookCommand, HandleWhopWebhookHandler};
use crate::domain::foundation::Timestamp;
use crate::domain::webhook::SIGNATURE_HEADERS;

use super::dto::{HealthQuery, HealthResponse, WebhookResponse};

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub handler: Arc<HandleWhopWebhookHandler>,
}

impl WebhookAppState {
    pub fn new(handler: Arc<HandleWhopWebhookHandler>) -> Self {
        Self { handler }
    }
}

/// First signature header present, in [`SIGNATURE_HEADERS`] order.
fn signature_from(headers: &HeaderMap) -> Option<String> {
    SIGNATURE_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// POST /api/webhooks/whop - Apply a membership event
pub async fn receive_whop_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let cmd = HandleWhopWebhookCommand {
        payload: body.to_vec(),
        signature: signature_from(&headers),
    };

    let result = state.handler.handle(cmd).await;
    let elapsed = started.elapsed().as_millis() as u64;

    match result {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, elapsed_ms = elapsed, "Webhook handled");
            (StatusCode::OK, Json(WebhookResponse::ok(elapsed))).into_response()
        }
        Err(error) => {
            let body = WebhookResponse::failed(error.to_string(), error.kind().as_str(), elapsed);
            (error.status_code(), Json(body)).into_response()
        }
    }
}

/// GET /api/webhooks/whop - Health check and challenge echo
pub async fn whop_webhook_health(Query(query): Query<HealthQuery>) -> Response {
    match query.challenge {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => Json(HealthResponse {
            status: "ok",
            endpoint: "whop-webhook",
            timestamp: Timestamp::now().as_datetime().to_rfc3339(),
        })
        .into_response(),
    }
}
