//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host or port")]
    InvalidAddress,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Firebase database URL")]
    InvalidDatabaseUrl,

    #[error("Firebase database URL must use HTTPS in production")]
    DatabaseUrlMustBeHttps,

    #[error("Webhook secret is too short (minimum {0} characters)")]
    WebhookSecretTooShort(usize),

    #[error("Admin API key is too short (minimum {0} characters)")]
    AdminKeyTooShort(usize),

    #[error("Plan id '{0}' is mapped to more than one plan")]
    DuplicatePlanId(String),

    #[error("Activation attempts must be between 1 and {0}")]
    InvalidMaxAttempts(u32),

    #[error("Retry base delay must be at most {0} ms")]
    RetryDelayTooLarge(u64),
}
