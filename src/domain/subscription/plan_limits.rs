//! Static plan-limits table.
//!
//! Token and quiz quotas, price and feature list for each plan.

use super::Plan;
use serde::Serialize;

/// Quotas and pricing for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    /// The plan these limits apply to.
    pub plan: Plan,
    /// AI tokens per billing month.
    pub tokens: u64,
    /// Quizzes per billing month.
    pub quizzes: u32,
    /// Monthly price in US cents.
    pub price_usd_cents: u32,
    /// Marketing feature list shown on the pricing page.
    pub features: &'static [&'static str],
}

impl PlanLimits {
    /// Get the limits for a specific plan.
    ///
    /// | Plan | Tokens | Quizzes | Price |
    /// |------|--------|---------|-------|
    /// | Free | 20,000 | 5 | $0 |
    /// | Basic | 250,000 | 50 | $4.99 |
    /// | Pro | 1,000,000 | 200 | $9.99 |
    /// | Premium | 5,000,000 | 1,000 | $19.99 |
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => Self {
                plan,
                tokens: 20_000,
                quizzes: 5,
                price_usd_cents: 0,
                features: &["MCQ quizzes", "Basic study guides"],
            },
            Plan::Basic => Self {
                plan,
                tokens: 250_000,
                quizzes: 50,
                price_usd_cents: 499,
                features: &["MCQ quizzes", "Full study guides", "Exam paper generator"],
            },
            Plan::Pro => Self {
                plan,
                tokens: 1_000_000,
                quizzes: 200,
                price_usd_cents: 999,
                features: &[
                    "MCQ quizzes",
                    "Full study guides",
                    "Exam paper generator",
                    "PDF export",
                    "Quiz Arena hosting",
                ],
            },
            Plan::Premium => Self {
                plan,
                tokens: 5_000_000,
                quizzes: 1_000,
                price_usd_cents: 1_999,
                features: &[
                    "MCQ quizzes",
                    "Full study guides",
                    "Exam paper generator",
                    "PDF export",
                    "Quiz Arena hosting",
                    "Priority support",
                ],
            },
        }
    }

    /// Monthly price in US dollars.
    pub fn price_usd(&self) -> f64 {
        f64::from(self.price_usd_cents) / 100.0
    }
}
