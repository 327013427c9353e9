//! Document store paths for subscription data.
//!
//! The layout is shared with the web client, so these strings are part of
//! the external contract.

use crate::domain::foundation::UserId;

use super::BillingPeriod;

/// Root of per-user nodes; children carry an `email` field used for lookup.
pub const USERS: &str = "users";

/// Root of pending checkout records polled by the success page.
pub const PENDING_PURCHASES: &str = "pending_purchases";

/// Collection that receives one auto-keyed entry per webhook failure.
pub const WEBHOOK_ERRORS: &str = "webhook_errors";

pub fn subscription(user_id: &UserId) -> String {
    format!("{}/{}/subscription", USERS, user_id)
}

pub fn metadata(user_id: &UserId) -> String {
    format!("{}/{}/metadata", USERS, user_id)
}

pub fn pending_plan_change(user_id: &UserId) -> String {
    format!("{}/{}/pending_plan_change", USERS, user_id)
}

/// `usage/{id}/{year}/{month}` with a zero-padded month.
pub fn usage(user_id: &UserId, period: BillingPeriod) -> String {
    format!("usage/{}/{}/{:02}", user_id, period.year, period.month)
}

pub fn pending_purchase(user_id: &UserId) -> String {
    format!("{}/{}", PENDING_PURCHASES, user_id)
}
