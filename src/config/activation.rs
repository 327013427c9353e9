//! Activation retry configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::webhook::RetryPolicy;

use super::error::ValidationError;

const MAX_ATTEMPTS_LIMIT: u32 = 10;
const MAX_BASE_DELAY_MS: u64 = 60_000;

/// In-process retry settings for webhook activations.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationConfig {
    /// Total attempts, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failure; doubles after each further one
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl ActivationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ValidationError::InvalidMaxAttempts(MAX_ATTEMPTS_LIMIT));
        }
        if self.base_delay_ms > MAX_BASE_DELAY_MS {
            return Err(ValidationError::RetryDelayTooLarge(MAX_BASE_DELAY_MS));
        }
        Ok(())
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    RetryPolicy::DEFAULT_BASE_DELAY.as_millis() as u64
}
