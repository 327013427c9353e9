//! Plan activation error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidPlan | 400 |
//! | InvalidRequest | 400 |
//! | UserNotFound | 404 |
//! | InvalidTransition | 409 |
//! | NothingToRepair | 409 |
//! | Store | 500 |

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Errors raised while activating, verifying or rolling back a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// Plan name is not one of the paid tiers.
    #[error("Invalid plan '{0}': expected one of basic, pro, premium")]
    InvalidPlan(String),

    /// Input failed validation before any write.
    #[error("Invalid {field}: {message}")]
    InvalidRequest { field: String, message: String },

    /// No internal user could be resolved.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Status change rejected by the status state machine.
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Auto-fix found no paid, active subscription to re-apply.
    #[error("Nothing to repair: {0}")]
    NothingToRepair(String),

    /// Document store read or write failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl ActivationError {
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        ActivationError::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether re-running the same activation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivationError::Store(_))
    }
}

impl From<ValidationError> for ActivationError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                ActivationError::invalid_request(field, "must not be empty")
            }
            ValidationError::InvalidFormat { field, reason } => {
                ActivationError::invalid_request(field, reason)
            }
        }
    }
}
