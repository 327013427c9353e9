//! Subscription status state machine.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Status stored in `subscription_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Plan entitlements apply.
    Active,

    /// User or provider cancelled; the record is kept.
    Cancelled,

    /// Billing period ended without renewal.
    Expired,
}

impl SubscriptionStatus {
    /// Returns the stored (snake_case) name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Active, Active) // Renewal
                | (Active, Cancelled)
                | (Active, Expired)
                | (Cancelled, Active)
                | (Cancelled, Expired)
                | (Expired, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Active => vec![Active, Cancelled, Expired],
            Cancelled => vec![Active, Expired],
            Expired => vec![Active],
        }
    }
}
