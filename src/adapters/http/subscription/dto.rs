//! HTTP DTOs for subscription and admin activation endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::{
    ActivatedNode, ActivationCheck, ActivationReceipt, Mismatch, Plan, PlanLimits,
    PurchaseStatus, SubscriptionSource, SubscriptionStatus,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Manual activation by an operator.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminActivateRequest {
    pub user_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub plan: String,
    pub subscription_id: String,
    /// Defaults to `admin`; use `promo_code` for zero-dollar grants.
    #[serde(default)]
    pub source: Option<SubscriptionSource>,
    #[serde(default)]
    pub amount: Option<f64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ActivationResponse {
    pub success: bool,
    pub plan: Plan,
    pub tokens_limit: u64,
    pub quizzes_limit: u32,
    pub activated_nodes: Vec<ActivatedNode>,
}

impl From<ActivationReceipt> for ActivationResponse {
    fn from(receipt: ActivationReceipt) -> Self {
        Self {
            success: true,
            plan: receipt.plan,
            tokens_limit: receipt.tokens_limit,
            quizzes_limit: receipt.quizzes_limit,
            activated_nodes: receipt.activated_nodes,
        }
    }
}

/// Verification state polled by the client after checkout.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    pub verified: bool,
    pub plan: Option<Plan>,
    pub status: Option<SubscriptionStatus>,
    pub mismatches: Vec<Mismatch>,
    pub pending_purchase: Option<PurchaseStatus>,
    /// Quotas and price of the current plan, for the billing page.
    pub plan_details: Option<PlanDetails>,
}

impl SubscriptionStatusResponse {
    pub fn new(check: ActivationCheck, pending_purchase: Option<PurchaseStatus>) -> Self {
        Self {
            verified: check.is_consistent(),
            plan_details: check.plan.map(|plan| PlanDetails::from(PlanLimits::for_plan(plan))),
            plan: check.plan,
            status: check.status,
            mismatches: check.mismatches,
            pending_purchase,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDetails {
    pub name: &'static str,
    pub tokens_limit: u64,
    pub quizzes_limit: u32,
    pub price_usd: f64,
    pub features: &'static [&'static str],
}

impl From<PlanLimits> for PlanDetails {
    fn from(limits: PlanLimits) -> Self {
        Self {
            name: limits.plan.display_name(),
            tokens_limit: limits.tokens,
            quizzes_limit: limits.quizzes,
            price_usd: limits.price_usd(),
            features: limits.features,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FixResponse {
    pub repaired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationResponse>,
}

/// Report returned to operators inspecting a user.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionResponse {
    pub user_id: String,
    pub verified: bool,
    #[serde(flatten)]
    pub check: ActivationCheck,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollbackResponse {
    pub success: bool,
    pub plan: Plan,
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_request_defaults_optional_fields() {
        let request: AdminActivateRequest = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "plan": "pro",
            "subscription_id": "manual_1"
        }))
        .unwrap();
        assert!(request.source.is_none());
        assert!(request.amount.is_none());
    }

    #[test]
    fn status_carries_details_of_current_plan() {
        let response = SubscriptionStatusResponse::new(
            ActivationCheck {
                plan: Some(Plan::Pro),
                status: Some(SubscriptionStatus::Active),
                mismatches: vec![],
            },
            None,
        );
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["verified"], true);
        assert_eq!(json["plan_details"]["name"], "Pro");
        assert_eq!(json["plan_details"]["tokens_limit"], 1_000_000);
        assert_eq!(json["plan_details"]["price_usd"], 9.99);
        assert!(json["plan_details"]["features"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("PDF export")));
    }

    #[test]
    fn status_without_subscription_has_no_details() {
        let response = SubscriptionStatusResponse::new(
            ActivationCheck {
                plan: None,
                status: None,
                mismatches: vec![Mismatch::SubscriptionMissing],
            },
            None,
        );
        let json = serde_json::to_value(response).unwrap();
        assert!(json["plan_details"].is_null());
    }

    #[test]
    fn inspection_flattens_check() {
        let response = InspectionResponse {
            user_id: "u1".to_string(),
            verified: false,
            check: ActivationCheck {
                plan: Some(Plan::Basic),
                status: Some(SubscriptionStatus::Active),
                mismatches: vec![Mismatch::UsageMissing],
            },
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["plan"], "basic");
        assert_eq!(json["mismatches"][0]["kind"], "usage_missing");
    }
}
