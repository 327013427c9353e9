//! HandleWhopWebhookHandler - Applies a Whop membership event.
//!
//! Flow: verify signature → parse → dispatch on event type. Activations
//! resolve the purchaser by email and retry with exponential backoff.
//! Every failure is appended to `webhook_errors` before it is returned.
//!
//! A purchaser with no account yet is not retried here: the error maps to
//! a 500 and Whop's own redelivery brings the event back later.

use std::sync::Arc;

use serde_json::Value;

use crate::application::handlers::subscription::PlanActivationService;
use crate::domain::foundation::UserId;
use crate::domain::subscription::{
    paths, ActivatePlanCommand, ActivationError, ActivationFailure, ActivationReceipt,
    SubscriptionSource, SubscriptionStatus,
};
use crate::domain::webhook::{
    PlanCatalog, RetryPolicy, WebhookAction, WebhookError, WebhookErrorKind,
    WebhookErrorLogEntry, WhopWebhookPayload, WhopWebhookVerifier,
};
use crate::ports::DocumentStore;

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleWhopWebhookCommand {
    pub payload: Vec<u8>,
    pub signature: Option<String>,
}

/// What a successfully handled delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Activated {
        user_id: UserId,
        receipt: ActivationReceipt,
        attempts: u32,
    },
    StatusUpdated {
        user_id: UserId,
        status: SubscriptionStatus,
    },
    Ignored {
        event: String,
        reason: String,
    },
}

/// Handler for Whop webhook deliveries.
pub struct HandleWhopWebhookHandler {
    activation: Arc<PlanActivationService>,
    store: Arc<dyn DocumentStore>,
    verifier: WhopWebhookVerifier,
    catalog: PlanCatalog,
    retry: RetryPolicy,
}

impl HandleWhopWebhookHandler {
    pub fn new(
        activation: Arc<PlanActivationService>,
        store: Arc<dyn DocumentStore>,
        verifier: WhopWebhookVerifier,
        catalog: PlanCatalog,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            activation,
            store,
            verifier,
            catalog,
            retry,
        }
    }

    pub async fn handle(&self, cmd: HandleWhopWebhookCommand) -> Result<WebhookOutcome, WebhookError> {
        match self.process(&cmd).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.log_failure(&error, &cmd.payload).await;
                Err(error)
            }
        }
    }

    async fn process(&self, cmd: &HandleWhopWebhookCommand) -> Result<WebhookOutcome, WebhookError> {
        // 1. Signature
        let signature = cmd.signature.as_deref().ok_or_else(|| {
            WebhookError::SignatureInvalid("missing signature header".to_string())
        })?;
        self.verifier.verify(&cmd.payload, signature)?;

        // 2. Payload
        let payload = WhopWebhookPayload::parse(&cmd.payload)?;
        let event_type = payload.event_type();
        tracing::info!(
            event = %payload.event,
            whop_user_id = payload.user_id.as_deref().unwrap_or(""),
            "Processing Whop webhook"
        );

        // 3. Dispatch
        match event_type.action() {
            WebhookAction::Activate | WebhookAction::Renew => self.activate(&payload).await,
            WebhookAction::SetStatus(status) => self.set_status(&payload, status).await,
            WebhookAction::Ignore => {
                tracing::debug!(event = %payload.event, "Ignoring unhandled webhook event");
                Ok(WebhookOutcome::Ignored {
                    event: payload.event.clone(),
                    reason: "unhandled event type".to_string(),
                })
            }
        }
    }

    async fn activate(&self, payload: &WhopWebhookPayload) -> Result<WebhookOutcome, WebhookError> {
        let email = payload.email()?;
        let plan = self.catalog.resolve(payload.required_plan_id()?);
        let subscription_id = payload.required_subscription_id()?;

        let (source, amount) = if payload.is_zero_dollar() {
            (SubscriptionSource::PromoCode, Some(0.0))
        } else {
            (SubscriptionSource::Whop, payload.amount)
        };
        let command_for = |user_id: UserId| ActivatePlanCommand {
            user_id,
            user_email: Some(email.clone()),
            plan: plan.clone(),
            subscription_id: subscription_id.to_string(),
            source,
            amount,
        };

        // Each attempt repeats the purchaser lookup as well as the writes.
        let mut attempt = 0;
        loop {
            let failure = match self.resolve_user(&email).await {
                Ok(user_id) => match self.activation.activate_plan(command_for(user_id.clone())).await {
                    Ok(receipt) => {
                        return Ok(WebhookOutcome::Activated {
                            user_id,
                            receipt,
                            attempts: attempt + 1,
                        })
                    }
                    Err(failure) => AttemptFailure::Activation(failure),
                },
                Err(error) => AttemptFailure::Lookup(error),
            };

            if !failure.is_retryable() {
                return Err(failure.into_webhook_error(attempt + 1));
            }
            if !self.retry.has_next(attempt) {
                return Err(WebhookError::PlanActivationFailed {
                    message: failure.to_string(),
                    attempts: attempt + 1,
                });
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                email = %email,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                written = failure.written(),
                error = %failure,
                "Activation attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn set_status(
        &self,
        payload: &WhopWebhookPayload,
        status: SubscriptionStatus,
    ) -> Result<WebhookOutcome, WebhookError> {
        let email = payload.email()?;
        let user_id = self.resolve_user(&email).await?;

        match self.activation.set_subscription_status(&user_id, status).await {
            Ok(()) => Ok(WebhookOutcome::StatusUpdated { user_id, status }),
            // A late cancel after expiry is not worth a redelivery.
            Err(ActivationError::InvalidTransition(reason)) => {
                tracing::info!(user_id = %user_id, reason = %reason, "Status event not applicable");
                Ok(WebhookOutcome::Ignored {
                    event: payload.event.clone(),
                    reason,
                })
            }
            Err(error) => Err(activation_error(error, 1)),
        }
    }

    /// Internal user whose profile `email` matches.
    ///
    /// Tries the address as sent, then its lowercase form. Profiles keep
    /// whatever casing the user registered with.
    async fn resolve_user(&self, email: &str) -> Result<UserId, WebhookError> {
        let mut matches = self
            .store
            .find_by_child(paths::USERS, "email", email)
            .await?;
        let lowercased = email.to_ascii_lowercase();
        if matches.is_empty() && lowercased != email {
            matches = self
                .store
                .find_by_child(paths::USERS, "email", &lowercased)
                .await?;
        }

        let mut keys = matches.into_iter().map(|(key, _)| key);
        let key = keys
            .next()
            .ok_or_else(|| WebhookError::UserNotFound(email.to_string()))?;
        if keys.next().is_some() {
            tracing::warn!(email, chosen = %key, "Several users share an email; using the first");
        }

        UserId::new(key.as_str()).map_err(|e| {
            tracing::warn!(email, key = %key, error = %e, "Matching user has an unusable key");
            WebhookError::UserNotFound(email.to_string())
        })
    }

    async fn log_failure(&self, error: &WebhookError, body: &[u8]) {
        match error.kind() {
            WebhookErrorKind::SignatureInvalid | WebhookErrorKind::InvalidPayload => {
                tracing::warn!(error_type = error.kind().as_str(), error = %error, "Rejected webhook");
            }
            WebhookErrorKind::UserNotFound => {
                tracing::warn!(error = %error, "No user for webhook; waiting for provider redelivery");
            }
            _ => {
                tracing::error!(error_type = error.kind().as_str(), error = %error, "Webhook processing failed");
            }
        }

        let retry_count = match error {
            WebhookError::PlanActivationFailed { attempts, .. } => attempts.saturating_sub(1),
            _ => 0,
        };
        let payload = serde_json::from_slice(body).unwrap_or(Value::Null);
        let entry = WebhookErrorLogEntry::new(error, payload, retry_count);

        let result = match serde_json::to_value(&entry) {
            Ok(value) => self
                .store
                .push(paths::WEBHOOK_ERRORS, value)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to write webhook error log");
        }
    }
}

/// Why one activation attempt failed.
enum AttemptFailure {
    Lookup(WebhookError),
    Activation(ActivationFailure),
}

impl AttemptFailure {
    /// Store outages are retried; a missing purchaser waits for redelivery.
    fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::Lookup(error) => matches!(error, WebhookError::Database(_)),
            AttemptFailure::Activation(failure) => failure.error.is_retryable(),
        }
    }

    fn written(&self) -> usize {
        match self {
            AttemptFailure::Lookup(_) => 0,
            AttemptFailure::Activation(failure) => failure.activated_nodes.len(),
        }
    }

    fn into_webhook_error(self, attempts: u32) -> WebhookError {
        match self {
            AttemptFailure::Lookup(error) => error,
            AttemptFailure::Activation(failure) => activation_error(failure.error, attempts),
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Lookup(error) => write!(f, "{}", error),
            AttemptFailure::Activation(failure) => write!(f, "{}", failure.error),
        }
    }
}

/// Maps a non-retried activation error onto the webhook taxonomy.
fn activation_error(error: ActivationError, attempts: u32) -> WebhookError {
    match error {
        ActivationError::InvalidPlan(_) | ActivationError::InvalidRequest { .. } => {
            WebhookError::InvalidPayload(error.to_string())
        }
        ActivationError::UserNotFound(user) => WebhookError::UserNotFound(user),
        ActivationError::Store(message) => WebhookError::Database(message),
        other => WebhookError::PlanActivationFailed {
            message: other.to_string(),
            attempts,
        },
    }
}
