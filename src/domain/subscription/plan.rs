//! Subscription plan definitions.
//!
//! Represents the plan tiers a student can hold.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ActivationError;

/// Subscription plan tier.
///
/// Determines token and quiz quotas and pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Default plan for every registered user.
    Free,

    /// Entry paid tier.
    Basic,

    /// Mid paid tier, most popular with MDCAT/ECAT candidates.
    Pro,

    /// Highest paid tier.
    Premium,
}

impl Plan {
    /// All plans in ascending rank order.
    pub const ALL: [Plan; 4] = [Plan::Free, Plan::Basic, Plan::Pro, Plan::Premium];

    /// Returns true if this plan is a paid plan.
    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::Free)
    }

    /// Returns the stored (lowercase) name of this plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
            Plan::Premium => "premium",
        }
    }

    /// Returns the display name for this plan.
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Basic => "Basic",
            Plan::Pro => "Pro",
            Plan::Premium => "Premium",
        }
    }

    /// Parses a plan name and requires it to be one of the paid tiers.
    ///
    /// # Errors
    ///
    /// `ActivationError::InvalidPlan` for unknown names and for `free`.
    pub fn parse_paid(value: &str) -> Result<Self, ActivationError> {
        match value.parse::<Plan>() {
            Ok(plan) if plan.is_paid() => Ok(plan),
            _ => Err(ActivationError::InvalidPlan(value.to_string())),
        }
    }
}

impl FromStr for Plan {
    type Err = ActivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "basic" => Ok(Plan::Basic),
            "pro" => Ok(Plan::Pro),
            "premium" => Ok(Plan::Premium),
            _ => Err(ActivationError::InvalidPlan(s.to_string())),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
