//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, validation)
//! - `subscription` - Plans, quotas, stored records and the activation contract
//! - `webhook` - Whop webhook parsing, verification and error taxonomy

pub mod foundation;
pub mod subscription;
pub mod webhook;
