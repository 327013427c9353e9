//! Webhook error taxonomy.
//!
//! Every failure maps to one of five logged error types, an HTTP status and
//! a retry classification.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Error type recorded in the `webhook_errors` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookErrorKind {
    SignatureInvalid,
    UserNotFound,
    PlanActivationFailed,
    DatabaseError,
    InvalidPayload,
}

impl WebhookErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookErrorKind::SignatureInvalid => "SIGNATURE_INVALID",
            WebhookErrorKind::UserNotFound => "USER_NOT_FOUND",
            WebhookErrorKind::PlanActivationFailed => "PLAN_ACTIVATION_FAILED",
            WebhookErrorKind::DatabaseError => "DATABASE_ERROR",
            WebhookErrorKind::InvalidPayload => "INVALID_PAYLOAD",
        }
    }
}

impl std::fmt::Display for WebhookErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature header missing or not matching the body.
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// Body is not a usable event.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// No registered user has the purchaser's email.
    #[error("User not found for email {0}")]
    UserNotFound(String),

    /// Activation kept failing after every in-process attempt.
    #[error("Plan activation failed after {attempts} attempt(s): {message}")]
    PlanActivationFailed { message: String, attempts: u32 },

    /// Store failure outside the activation itself.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    pub fn kind(&self) -> WebhookErrorKind {
        match self {
            WebhookError::SignatureInvalid(_) => WebhookErrorKind::SignatureInvalid,
            WebhookError::InvalidPayload(_) => WebhookErrorKind::InvalidPayload,
            WebhookError::UserNotFound(_) => WebhookErrorKind::UserNotFound,
            WebhookError::PlanActivationFailed { .. } => WebhookErrorKind::PlanActivationFailed,
            WebhookError::Database(_) => WebhookErrorKind::DatabaseError,
        }
    }

    /// Returns true if a later delivery of the same event may succeed.
    ///
    /// `UserNotFound` counts as retryable: the purchaser may register after
    /// paying, and the provider's redelivery picks the event up again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::UserNotFound(_)
                | WebhookError::PlanActivationFailed { .. }
                | WebhookError::Database(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Non-2xx responses make the provider redeliver; 4xx marks the
    /// delivery as permanently bad.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::SignatureInvalid(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::UserNotFound(_)
            | WebhookError::PlanActivationFailed { .. }
            | WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
