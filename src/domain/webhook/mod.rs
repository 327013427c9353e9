//! Payment webhook domain module.
//!
//! Payload parsing, signature verification, the error taxonomy and the
//! retry schedule used when applying Whop membership events.

mod error_log;
mod errors;
mod event;
mod retry;
mod verifier;

pub use error_log::WebhookErrorLogEntry;
pub use errors::{WebhookError, WebhookErrorKind};
pub use event::{PlanCatalog, WebhookAction, WhopEventType, WhopWebhookPayload};
pub use retry::RetryPolicy;
pub use verifier::{WhopWebhookVerifier, SIGNATURE_HEADERS};
