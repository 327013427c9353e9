//! Stored record shapes for subscription, usage, metadata and pending purchases.
//!
//! Field names are snake_case to match what the web client reads.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::{ActivationGrant, Plan, PlanLimits, SubscriptionSource, SubscriptionStatus};

/// Calendar month that usage counters belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BillingPeriod {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl BillingPeriod {
    /// The billing month containing `at` (UTC).
    pub fn containing(at: Timestamp) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }
}

/// `users/{id}/subscription`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub plan: Plan,
    #[serde(default)]
    pub subscription_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_source: SubscriptionSource,
    pub tokens_used: u64,
    pub tokens_limit: u64,
    pub quizzes_used: u32,
    pub quizzes_limit: u32,
    pub billing_cycle_start: Timestamp,
    pub billing_cycle_end: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub activation_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activation_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<f64>,
}

impl SubscriptionRecord {
    /// Record written by a successful activation.
    ///
    /// Counters always reset to zero and the error is cleared; only
    /// `created_at` and the attempt counter carry over from `existing`.
    pub fn activated(
        grant: &ActivationGrant,
        existing: Option<&SubscriptionRecord>,
        now: Timestamp,
    ) -> Self {
        let limits = PlanLimits::for_plan(grant.plan);
        Self {
            plan: grant.plan,
            subscription_id: Some(grant.subscription_id.clone()),
            subscription_status: SubscriptionStatus::Active,
            subscription_source: grant.source,
            tokens_used: 0,
            tokens_limit: limits.tokens,
            quizzes_used: 0,
            quizzes_limit: limits.quizzes,
            billing_cycle_start: now,
            billing_cycle_end: now.add_months(1),
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
            activation_attempts: existing.map(|r| r.activation_attempts).unwrap_or(0) + 1,
            last_activation_error: None,
            user_email: grant.user_email.clone(),
            amount_paid: grant.amount,
        }
    }

    /// Free-plan record written by a rollback.
    pub fn free(existing: Option<&SubscriptionRecord>, now: Timestamp) -> Self {
        let limits = PlanLimits::for_plan(Plan::Free);
        Self {
            plan: Plan::Free,
            subscription_id: None,
            subscription_status: SubscriptionStatus::Active,
            subscription_source: SubscriptionSource::Admin,
            tokens_used: 0,
            tokens_limit: limits.tokens,
            quizzes_used: 0,
            quizzes_limit: limits.quizzes,
            billing_cycle_start: now,
            billing_cycle_end: now.add_months(1),
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
            activation_attempts: existing.map(|r| r.activation_attempts).unwrap_or(0),
            last_activation_error: None,
            user_email: existing.and_then(|r| r.user_email.clone()),
            amount_paid: None,
        }
    }
}

/// `usage/{id}/{year}/{month}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub plan: Plan,
    pub tokens_used: u64,
    pub tokens_limit: u64,
    pub quizzes_created: u32,
    pub quizzes_limit: u32,
    pub year: i32,
    pub month: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UsageRecord {
    /// Fresh counters for `plan` in `period`, keeping `created_at` if the
    /// month already had a record.
    pub fn reset(
        plan: Plan,
        period: BillingPeriod,
        existing: Option<&UsageRecord>,
        now: Timestamp,
    ) -> Self {
        let limits = PlanLimits::for_plan(plan);
        Self {
            plan,
            tokens_used: 0,
            tokens_limit: limits.tokens,
            quizzes_created: 0,
            quizzes_limit: limits.quizzes,
            year: period.year,
            month: period.month,
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        }
    }
}

/// `users/{id}/metadata`.
///
/// Only the denormalized plan fields are modelled; the node carries other
/// profile data that is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Checkout state polled by the success page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Processing,
    Completed,
    Failed,
}

/// `pending_purchases/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPurchase {
    pub status: PurchaseStatus,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap())
    }

    fn grant(plan: Plan, subscription_id: &str) -> ActivationGrant {
        ActivationGrant {
            user_id: UserId::new("u1").unwrap(),
            user_email: Some("student@example.pk".to_string()),
            plan,
            subscription_id: subscription_id.to_string(),
            source: SubscriptionSource::Whop,
            amount: Some(9.99),
        }
    }

    #[test]
    fn billing_period_uses_calendar_month() {
        assert_eq!(
            BillingPeriod::containing(at(2025, 11, 30)),
            BillingPeriod { year: 2025, month: 11 }
        );
    }

    #[test]
    fn activated_record_sets_limits_and_resets_counters() {
        let now = at(2025, 1, 10);
        let record = SubscriptionRecord::activated(&grant(Plan::Pro, "mem_1"), None, now);

        assert_eq!(record.plan, Plan::Pro);
        assert_eq!(record.tokens_limit, 1_000_000);
        assert_eq!(record.quizzes_limit, 200);
        assert_eq!(record.tokens_used, 0);
        assert_eq!(record.quizzes_used, 0);
        assert_eq!(record.subscription_status, SubscriptionStatus::Active);
        assert_eq!(record.created_at, now);
        assert_eq!(record.billing_cycle_end, at(2025, 2, 10));
        assert_eq!(record.activation_attempts, 1);
    }

    #[test]
    fn activated_record_preserves_created_at_and_counts_attempts() {
        let first = SubscriptionRecord::activated(&grant(Plan::Basic, "mem_1"), None, at(2025, 1, 1));
        let mut used = first.clone();
        used.tokens_used = 4_000;
        used.last_activation_error = Some("timeout".to_string());

        let second =
            SubscriptionRecord::activated(&grant(Plan::Premium, "mem_2"), Some(&used), at(2025, 3, 1));

        assert_eq!(second.created_at, at(2025, 1, 1));
        assert_eq!(second.activation_attempts, 2);
        assert_eq!(second.tokens_used, 0);
        assert_eq!(second.subscription_id.as_deref(), Some("mem_2"));
        assert!(second.last_activation_error.is_none());
    }

    #[test]
    fn free_record_clears_subscription() {
        let paid = SubscriptionRecord::activated(&grant(Plan::Pro, "mem_1"), None, at(2025, 1, 1));
        let free = SubscriptionRecord::free(Some(&paid), at(2025, 1, 5));

        assert_eq!(free.plan, Plan::Free);
        assert_eq!(free.tokens_limit, PlanLimits::for_plan(Plan::Free).tokens);
        assert!(free.subscription_id.is_none());
        assert_eq!(free.subscription_source, SubscriptionSource::Admin);
        assert_eq!(free.created_at, at(2025, 1, 1));
    }

    #[test]
    fn usage_reset_mirrors_plan_limits() {
        let period = BillingPeriod { year: 2025, month: 6 };
        let usage = UsageRecord::reset(Plan::Basic, period, None, at(2025, 6, 2));

        assert_eq!(usage.plan, Plan::Basic);
        assert_eq!(usage.tokens_limit, 250_000);
        assert_eq!(usage.quizzes_limit, 50);
        assert_eq!((usage.year, usage.month), (2025, 6));
        assert_eq!(usage.tokens_used, 0);
        assert_eq!(usage.quizzes_created, 0);
    }

    #[test]
    fn usage_reset_within_month_keeps_created_at() {
        let period = BillingPeriod { year: 2025, month: 6 };
        let mut first = UsageRecord::reset(Plan::Basic, period, None, at(2025, 6, 2));
        first.tokens_used = 12_000;
        first.quizzes_created = 7;

        let again = UsageRecord::reset(Plan::Pro, period, Some(&first), at(2025, 6, 20));

        assert_eq!(again.created_at, at(2025, 6, 2));
        assert_eq!(again.updated_at, at(2025, 6, 20));
        assert_eq!(again.plan, Plan::Pro);
        assert_eq!(again.tokens_limit, 1_000_000);
        assert_eq!((again.tokens_used, again.quizzes_created), (0, 0));
    }

    #[test]
    fn subscription_record_omits_empty_error_field() {
        let record = SubscriptionRecord::activated(&grant(Plan::Pro, "mem_1"), None, at(2025, 1, 1));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("last_activation_error").is_none());
        assert_eq!(json["subscription_status"], "active");
        assert_eq!(json["subscription_source"], "whop");
    }

    #[test]
    fn metadata_tolerates_unrelated_fields() {
        let json = serde_json::json!({
            "display_name": "Ayesha",
            "plan": "pro",
            "subscription_id": "mem_1"
        });
        let metadata: MetadataRecord = serde_json::from_value(json).unwrap();
        assert_eq!(metadata.plan, Some(Plan::Pro));
        assert!(metadata.updated_at.is_none());
    }
}
