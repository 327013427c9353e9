//! Subscription handlers.
//!
//! Activation, verification, repair and rollback of a user's plan across
//! the subscription, usage and metadata records.

mod plan_activation;

pub use plan_activation::PlanActivationService;
