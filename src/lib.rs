//! Plan Activation - Idempotent subscription plan activation
//!
//! Applies Whop membership webhooks to a user's subscription, usage and
//! metadata records in a path-addressed document store, with bounded
//! retries, an error log, and verification, repair and rollback of the
//! resulting state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
