//! Whop webhook payload and event types.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::domain::subscription::{Plan, SubscriptionStatus};

use super::WebhookError;

/// Normalized webhook body.
///
/// The checkout bridge flattens Whop's membership object into these fields
/// before forwarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhopWebhookPayload {
    pub event: String,
    /// Whop's own user id; not an internal id.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default, deserialize_with = "amount_from_number_or_string")]
    pub amount: Option<f64>,
}

impl WhopWebhookPayload {
    /// Parses the raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    pub fn event_type(&self) -> WhopEventType {
        WhopEventType::from_event_name(&self.event)
    }

    /// Email of the purchaser, trimmed but otherwise as sent.
    pub fn email(&self) -> Result<String, WebhookError> {
        self.user_email
            .as_deref()
            .map(|e| e.trim().to_string())
            .filter(|e| e.contains('@'))
            .ok_or_else(|| WebhookError::InvalidPayload("missing or invalid userEmail".to_string()))
    }

    pub fn required_plan_id(&self) -> Result<&str, WebhookError> {
        non_empty(self.plan_id.as_deref())
            .ok_or_else(|| WebhookError::InvalidPayload("missing planId".to_string()))
    }

    pub fn required_subscription_id(&self) -> Result<&str, WebhookError> {
        non_empty(self.subscription_id.as_deref())
            .ok_or_else(|| WebhookError::InvalidPayload("missing subscriptionId".to_string()))
    }

    /// True when the purchase was a zero-dollar (promo code) checkout.
    pub fn is_zero_dollar(&self) -> bool {
        self.amount.map(|a| a == 0.0).unwrap_or(false)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whop forwards amounts either as JSON numbers or decimal strings.
fn amount_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid amount '{}'", s))),
    }
}

/// Whop webhook event types handled by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhopEventType {
    MembershipCreated,
    MembershipActivated,
    MembershipCancelled,
    MembershipExpired,
    MembershipRenewed,
    Unknown(String),
}

impl WhopEventType {
    /// Accepts both `membership_created` and `membership.created` spellings.
    pub fn from_event_name(name: &str) -> Self {
        match name.trim().replace('.', "_").as_str() {
            "membership_created" => WhopEventType::MembershipCreated,
            "membership_activated" | "membership_went_valid" => WhopEventType::MembershipActivated,
            "membership_cancelled" | "membership_canceled" => WhopEventType::MembershipCancelled,
            "membership_expired" | "membership_went_invalid" => WhopEventType::MembershipExpired,
            "membership_renewed" => WhopEventType::MembershipRenewed,
            _ => WhopEventType::Unknown(name.to_string()),
        }
    }

    /// What the receiver does for this event.
    pub fn action(&self) -> WebhookAction {
        match self {
            WhopEventType::MembershipCreated | WhopEventType::MembershipActivated => {
                WebhookAction::Activate
            }
            WhopEventType::MembershipRenewed => WebhookAction::Renew,
            WhopEventType::MembershipCancelled => {
                WebhookAction::SetStatus(SubscriptionStatus::Cancelled)
            }
            WhopEventType::MembershipExpired => WebhookAction::SetStatus(SubscriptionStatus::Expired),
            WhopEventType::Unknown(_) => WebhookAction::Ignore,
        }
    }
}

/// Dispatch target for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    Activate,
    /// New billing cycle; applied as an activation so counters reset.
    Renew,
    SetStatus(SubscriptionStatus),
    Ignore,
}

/// Maps Whop plan ids to internal plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCatalog {
    by_provider_id: HashMap<String, Plan>,
}

impl PlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(mut self, provider_plan_id: impl Into<String>, plan: Plan) -> Self {
        self.by_provider_id.insert(provider_plan_id.into(), plan);
        self
    }

    /// Resolves a provider plan id, falling back to plain plan names.
    ///
    /// Unresolvable ids are returned unchanged so activation rejects them
    /// with a descriptive invalid-plan error.
    pub fn resolve(&self, plan_id: &str) -> String {
        let plan_id = plan_id.trim();
        if let Some(plan) = self.by_provider_id.get(plan_id) {
            return plan.as_str().to_string();
        }
        match plan_id.parse::<Plan>() {
            Ok(plan) => plan.as_str().to_string(),
            Err(_) => plan_id.to_string(),
        }
    }
}
