//! Application layer - Handlers orchestrating domain operations over ports.

pub mod handlers;

pub use handlers::subscription::PlanActivationService;
pub use handlers::webhook::{HandleWhopWebhookCommand, HandleWhopWebhookHandler, WebhookOutcome};
