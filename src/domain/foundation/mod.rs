//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, validation errors and the state machine trait
//! used by the subscription and webhook domains.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::UserId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
