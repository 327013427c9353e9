//! Payment configuration (Whop)

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::subscription::Plan;
use crate::domain::webhook::PlanCatalog;

use super::error::ValidationError;

const MIN_WEBHOOK_SECRET_LEN: usize = 16;
const MIN_ADMIN_KEY_LEN: usize = 24;

/// Payment configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Whop webhook signing secret
    pub whop_webhook_secret: String,

    /// Whop plan id of the Basic plan
    pub whop_basic_plan_id: Option<String>,

    /// Whop plan id of the Pro plan
    pub whop_pro_plan_id: Option<String>,

    /// Whop plan id of the Premium plan
    pub whop_premium_plan_id: Option<String>,

    /// Key for the admin activation endpoints; they are disabled when unset
    pub admin_api_key: Option<String>,
}

impl PaymentConfig {
    pub fn webhook_secret(&self) -> SecretString {
        SecretString::new(self.whop_webhook_secret.clone())
    }

    pub fn admin_api_key(&self) -> Option<SecretString> {
        self.admin_api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.clone()))
    }

    /// Mapping from configured Whop plan ids to plans.
    pub fn plan_catalog(&self) -> PlanCatalog {
        self.plan_ids()
            .fold(PlanCatalog::new(), |catalog, (id, plan)| catalog.with_plan(id, plan))
    }

    fn plan_ids(&self) -> impl Iterator<Item = (&str, Plan)> {
        [
            (self.whop_basic_plan_id.as_deref(), Plan::Basic),
            (self.whop_pro_plan_id.as_deref(), Plan::Pro),
            (self.whop_premium_plan_id.as_deref(), Plan::Premium),
        ]
        .into_iter()
        .filter_map(|(id, plan)| id.map(str::trim).filter(|i| !i.is_empty()).map(|i| (i, plan)))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.whop_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__WHOP_WEBHOOK_SECRET"));
        }
        if self.whop_webhook_secret.len() < MIN_WEBHOOK_SECRET_LEN {
            return Err(ValidationError::WebhookSecretTooShort(MIN_WEBHOOK_SECRET_LEN));
        }
        if let Some(key) = self.admin_api_key.as_deref().filter(|k| !k.is_empty()) {
            if key.len() < MIN_ADMIN_KEY_LEN {
                return Err(ValidationError::AdminKeyTooShort(MIN_ADMIN_KEY_LEN));
            }
        }

        let ids: Vec<&str> = self.plan_ids().map(|(id, _)| id).collect();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(ValidationError::DuplicatePlanId(id.to_string()));
            }
        }
        Ok(())
    }
}
