//! Where a subscription grant came from.

use serde::{Deserialize, Serialize};

/// Stored in `subscription_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionSource {
    /// Paid checkout through Whop.
    Whop,
    /// Zero-dollar grant from a promo code.
    PromoCode,
    /// Manual grant or rollback by an operator.
    Admin,
}
