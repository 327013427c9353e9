//! HTTP handlers for subscription and admin activation endpoints.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Json, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::application::handlers::subscription::PlanActivationService;
use crate::domain::foundation::{UserId, ValidationError};
use crate::domain::subscription::{
    ActivatePlanCommand, ActivationError, ActivationFailure, Plan, RepairOutcome,
    SubscriptionSource,
};

use super::dto::{
    ActivationResponse, AdminActivateRequest, ErrorResponse, FixResponse, InspectionResponse,
    RollbackResponse, SubscriptionStatusResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SubscriptionAppState {
    pub activation: Arc<PlanActivationService>,
    /// Admin endpoints are disabled when unset.
    pub admin_api_key: Option<SecretString>,
}

impl SubscriptionAppState {
    pub fn new(activation: Arc<PlanActivationService>, admin_api_key: Option<SecretString>) -> Self {
        Self {
            activation,
            admin_api_key,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Request Context
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identified by the `X-User-Id` header set by the gateway.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

/// Marker for requests carrying the configured `X-Admin-Key`.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

pub enum AdminRejection {
    Disabled,
    InvalidKey,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AdminRejection::Disabled => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("ADMIN_DISABLED", "Admin API is not configured"),
            ),
            AdminRejection::InvalidKey => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("ADMIN_AUTH_REQUIRED", "A valid admin key is required"),
            ),
        };
        (status, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl FromRequestParts<SubscriptionAppState> for AdminAccess {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SubscriptionAppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.admin_api_key.as_ref().ok_or(AdminRejection::Disabled)?;
        let provided = parts
            .headers
            .get("X-Admin-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or(AdminRejection::InvalidKey)?;

        let expected = expected.expose_secret().as_bytes();
        let provided = provided.as_bytes();
        if expected.len() == provided.len() && bool::from(expected.ct_eq(provided)) {
            Ok(AdminAccess)
        } else {
            Err(AdminRejection::InvalidKey)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscription/status - Verification state for the caller
pub async fn get_subscription_status(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let check = state.activation.inspect_activation(&user.user_id).await?;
    let pending = state.activation.pending_purchase(&user.user_id).await?;

    Ok(Json(SubscriptionStatusResponse::new(
        check,
        pending.map(|p| p.status),
    )))
}

/// POST /api/subscription/fix - Repair an inconsistent activation
pub async fn fix_subscription(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let response = match state.activation.repair_activation(&user.user_id).await? {
        RepairOutcome::AlreadyConsistent => FixResponse {
            repaired: false,
            activation: None,
        },
        RepairOutcome::Repaired(receipt) => FixResponse {
            repaired: true,
            activation: Some(ActivationResponse::from(receipt)),
        },
    };
    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/activations - Manual or promo activation
pub async fn admin_activate(
    State(state): State<SubscriptionAppState>,
    _admin: AdminAccess,
    Json(request): Json<AdminActivateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ActivatePlanCommand {
        user_id: UserId::new(request.user_id)?,
        user_email: request.user_email,
        plan: request.plan,
        subscription_id: request.subscription_id,
        source: request.source.unwrap_or(SubscriptionSource::Admin),
        amount: request.amount,
    };

    let receipt = state.activation.activate_plan(cmd).await?;
    Ok((StatusCode::CREATED, Json(ActivationResponse::from(receipt))))
}

/// GET /api/admin/activations/:user_id - Inspect a user's records
pub async fn admin_inspect(
    State(state): State<SubscriptionAppState>,
    _admin: AdminAccess,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(user_id)?;
    let check = state.activation.inspect_activation(&user_id).await?;

    Ok(Json(InspectionResponse {
        user_id: user_id.to_string(),
        verified: check.is_consistent(),
        check,
    }))
}

/// POST /api/admin/activations/:user_id/rollback - Reset to free plan
pub async fn admin_rollback(
    State(state): State<SubscriptionAppState>,
    _admin: AdminAccess,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(user_id)?;
    state.activation.rollback_activation(&user_id).await?;

    Ok(Json(RollbackResponse {
        success: true,
        plan: Plan::Free,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts activation errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    error: ActivationError,
    details: Option<serde_json::Value>,
}

impl From<ActivationError> for ApiError {
    fn from(error: ActivationError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ActivationError::from(err).into()
    }
}

impl From<ActivationFailure> for ApiError {
    fn from(failure: ActivationFailure) -> Self {
        Self {
            details: Some(serde_json::json!({ "activated_nodes": failure.activated_nodes })),
            error: failure.error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.error {
            ActivationError::InvalidPlan(_) => (StatusCode::BAD_REQUEST, "INVALID_PLAN"),
            ActivationError::InvalidRequest { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            ActivationError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            ActivationError::InvalidTransition(_) => {
                (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
            }
            ActivationError::NothingToRepair(_) => (StatusCode::CONFLICT, "NOTHING_TO_REPAIR"),
            ActivationError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        };

        let message = self.error.to_string();
        let body = match self.details {
            Some(details) => ErrorResponse::with_details(error_code, message, details),
            None => ErrorResponse::new(error_code, message),
        };
        (status, Json(body)).into_response()
    }
}
