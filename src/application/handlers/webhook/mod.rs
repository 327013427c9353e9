//! Payment webhook handlers.

mod handle_whop_webhook;

pub use handle_whop_webhook::{HandleWhopWebhookCommand, HandleWhopWebhookHandler, WebhookOutcome};
