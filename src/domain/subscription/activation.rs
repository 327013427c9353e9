//! Activation commands, receipts and consistency reports.

use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::UserId;

use super::{ActivationError, Plan, PlanLimits, SubscriptionSource, SubscriptionStatus};

/// Request to move a user onto a paid plan.
///
/// `plan` is kept as received so that unknown names are rejected by the
/// activation itself, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivatePlanCommand {
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub plan: String,
    pub subscription_id: String,
    pub source: SubscriptionSource,
    /// Amount paid in USD; `Some(0.0)` for zero-dollar grants.
    pub amount: Option<f64>,
}

impl ActivatePlanCommand {
    /// Checks the command and produces the typed grant to apply.
    ///
    /// # Errors
    ///
    /// - `InvalidPlan` unless the plan is basic, pro or premium
    /// - `InvalidRequest` for an empty subscription id or a negative amount
    pub fn validate(&self) -> Result<ActivationGrant, ActivationError> {
        let plan = Plan::parse_paid(&self.plan)?;

        let subscription_id = self.subscription_id.trim();
        if subscription_id.is_empty() {
            return Err(ActivationError::invalid_request(
                "subscription_id",
                "must not be empty",
            ));
        }

        if let Some(amount) = self.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ActivationError::invalid_request(
                    "amount",
                    format!("must be a non-negative number, got {}", amount),
                ));
            }
        }

        Ok(ActivationGrant {
            user_id: self.user_id.clone(),
            user_email: self.user_email.clone(),
            plan,
            subscription_id: subscription_id.to_string(),
            source: self.source,
            amount: self.amount,
        })
    }
}

/// A validated activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationGrant {
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub plan: Plan,
    pub subscription_id: String,
    pub source: SubscriptionSource,
    pub amount: Option<f64>,
}

impl ActivationGrant {
    /// True for promo-code and other zero-dollar grants.
    pub fn is_zero_dollar(&self) -> bool {
        self.amount == Some(0.0)
    }
}

/// One of the three denormalized records an activation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivatedNode {
    Subscription,
    Usage,
    Metadata,
}

impl ActivatedNode {
    /// Write order; verification relies on it.
    pub const ORDER: [ActivatedNode; 3] = [
        ActivatedNode::Subscription,
        ActivatedNode::Usage,
        ActivatedNode::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivatedNode::Subscription => "subscription",
            ActivatedNode::Usage => "usage",
            ActivatedNode::Metadata => "metadata",
        }
    }
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReceipt {
    pub plan: Plan,
    pub tokens_limit: u64,
    pub quizzes_limit: u32,
    pub activated_nodes: Vec<ActivatedNode>,
}

impl ActivationReceipt {
    pub fn new(plan: Plan, activated_nodes: Vec<ActivatedNode>) -> Self {
        let limits = PlanLimits::for_plan(plan);
        Self {
            plan,
            tokens_limit: limits.tokens,
            quizzes_limit: limits.quizzes,
            activated_nodes,
        }
    }
}

/// Failed activation, with the nodes that were written before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct ActivationFailure {
    pub error: ActivationError,
    pub activated_nodes: Vec<ActivatedNode>,
}

impl ActivationFailure {
    /// Failure before any write.
    pub fn before_writes(error: ActivationError) -> Self {
        Self {
            error,
            activated_nodes: Vec::new(),
        }
    }
}

/// A disagreement between the subscription record and its copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    SubscriptionMissing,
    NotActive { status: SubscriptionStatus },
    UsageMissing,
    UsagePlan { expected: Plan, found: Plan },
    UsageTokenLimit { expected: u64, found: u64 },
    MetadataMissing,
    MetadataPlan { expected: Plan, found: Option<Plan> },
}

/// Result of comparing subscription, usage and metadata for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationCheck {
    pub plan: Option<Plan>,
    pub status: Option<SubscriptionStatus>,
    pub mismatches: Vec<Mismatch>,
}

impl ActivationCheck {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Outcome of an auto-fix request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Records already agree; nothing was written.
    AlreadyConsistent,
    /// The stored plan was re-applied.
    Repaired(ActivationReceipt),
}
