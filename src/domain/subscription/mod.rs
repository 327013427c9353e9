//! Subscription domain module.
//!
//! Plans, quotas, stored record shapes and the activation contract.
//!
//! # Module Structure
//!
//! - `plan` - Plan tiers
//! - `plan_limits` - Static quota table per plan
//! - `status` - SubscriptionStatus state machine
//! - `source` - Origin of a grant
//! - `records` - Stored subscription/usage/metadata/pending purchase shapes
//! - `paths` - Document store layout
//! - `activation` - Commands, receipts and consistency reports
//! - `errors` - Activation errors

mod activation;
mod errors;
pub mod paths;
mod plan;
mod plan_limits;
mod records;
mod source;
mod status;

pub use activation::{
    ActivatePlanCommand, ActivatedNode, ActivationCheck, ActivationFailure, ActivationGrant,
    ActivationReceipt, Mismatch, RepairOutcome,
};
pub use errors::ActivationError;
pub use plan::Plan;
pub use plan_limits::PlanLimits;
pub use records::{
    BillingPeriod, MetadataRecord, PendingPurchase, PurchaseStatus, SubscriptionRecord,
    UsageRecord,
};
pub use source::SubscriptionSource;
pub use status::SubscriptionStatus;
