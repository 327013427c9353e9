//! PlanActivationService - Writes and checks the three records that make
//! up a user's plan.
//!
//! Activation is an ordered, best-effort multi-write:
//! subscription → usage → metadata → cleanup. The store has no
//! multi-path transactions, so a failure part way leaves earlier nodes
//! written. Every write is a fixed-value overwrite, which makes a rerun
//! with the same inputs converge; `verify_activation` detects the gap
//! in between.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::domain::foundation::{StateMachine, Timestamp, UserId};
use crate::domain::subscription::{
    paths, ActivatePlanCommand, ActivatedNode, ActivationCheck, ActivationError,
    ActivationFailure, ActivationGrant, ActivationReceipt, BillingPeriod, MetadataRecord,
    Mismatch, PendingPurchase, Plan, PurchaseStatus, RepairOutcome, SubscriptionRecord,
    SubscriptionStatus, UsageRecord,
};
use crate::ports::{DocumentStore, DocumentStoreExt, StoreError};

/// Service owning plan activation, verification and rollback.
pub struct PlanActivationService {
    store: Arc<dyn DocumentStore>,
}

impl PlanActivationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Activates a paid plan for a user.
    ///
    /// An invalid plan fails before anything is written. A store failure
    /// stops the sequence, is recorded on the subscription record when
    /// possible, and is returned with the nodes written before it.
    pub async fn activate_plan(
        &self,
        cmd: ActivatePlanCommand,
    ) -> Result<ActivationReceipt, ActivationFailure> {
        let grant = cmd.validate().map_err(|error| {
            tracing::warn!(
                user_id = %cmd.user_id,
                plan = %cmd.plan,
                error = %error,
                "Rejected plan activation"
            );
            ActivationFailure::before_writes(error)
        })?;

        let now = Timestamp::now();
        let mut nodes = Vec::with_capacity(ActivatedNode::ORDER.len());

        match self.write_activation(&grant, now, &mut nodes).await {
            Ok(()) => {
                tracing::info!(
                    user_id = %grant.user_id,
                    plan = grant.plan.as_str(),
                    subscription_id = %grant.subscription_id,
                    zero_dollar = grant.is_zero_dollar(),
                    "Plan activated"
                );
                Ok(ActivationReceipt::new(grant.plan, nodes))
            }
            Err(error) => {
                tracing::error!(
                    user_id = %grant.user_id,
                    plan = grant.plan.as_str(),
                    written = nodes.len(),
                    error = %error,
                    "Plan activation failed part way"
                );
                self.record_activation_error(&grant.user_id, &error, now).await;
                Err(ActivationFailure {
                    error,
                    activated_nodes: nodes,
                })
            }
        }
    }

    /// True iff the subscription is active and usage and metadata agree
    /// with it. Read failures count as not verified.
    pub async fn verify_activation(&self, user_id: &UserId) -> bool {
        match self.inspect_activation(user_id).await {
            Ok(check) => {
                if !check.is_consistent() {
                    tracing::warn!(
                        user_id = %user_id,
                        mismatches = ?check.mismatches,
                        "Activation verification failed"
                    );
                }
                check.is_consistent()
            }
            Err(error) => {
                tracing::error!(user_id = %user_id, error = %error, "Could not verify activation");
                false
            }
        }
    }

    /// Reports every disagreement between the three records.
    pub async fn inspect_activation(
        &self,
        user_id: &UserId,
    ) -> Result<ActivationCheck, ActivationError> {
        let Some(subscription) = self
            .store
            .read::<SubscriptionRecord>(&paths::subscription(user_id))
            .await?
        else {
            return Ok(ActivationCheck {
                plan: None,
                status: None,
                mismatches: vec![Mismatch::SubscriptionMissing],
            });
        };

        let mut mismatches = Vec::new();
        if subscription.subscription_status != SubscriptionStatus::Active {
            mismatches.push(Mismatch::NotActive {
                status: subscription.subscription_status,
            });
        }

        let period = BillingPeriod::containing(Timestamp::now());
        match self
            .store
            .read::<UsageRecord>(&paths::usage(user_id, period))
            .await?
        {
            None => mismatches.push(Mismatch::UsageMissing),
            Some(usage) => {
                if usage.plan != subscription.plan {
                    mismatches.push(Mismatch::UsagePlan {
                        expected: subscription.plan,
                        found: usage.plan,
                    });
                }
                if usage.tokens_limit != subscription.tokens_limit {
                    mismatches.push(Mismatch::UsageTokenLimit {
                        expected: subscription.tokens_limit,
                        found: usage.tokens_limit,
                    });
                }
            }
        }

        match self
            .store
            .read::<MetadataRecord>(&paths::metadata(user_id))
            .await?
        {
            None => mismatches.push(Mismatch::MetadataMissing),
            Some(metadata) if metadata.plan != Some(subscription.plan) => {
                mismatches.push(Mismatch::MetadataPlan {
                    expected: subscription.plan,
                    found: metadata.plan,
                });
            }
            Some(_) => {}
        }

        Ok(ActivationCheck {
            plan: Some(subscription.plan),
            status: Some(subscription.subscription_status),
            mismatches,
        })
    }

    /// Resets a user to the free plan and fails any pending purchase.
    ///
    /// Only ever called explicitly; a failed activation is left for retry
    /// or repair instead.
    pub async fn rollback_activation(&self, user_id: &UserId) -> Result<(), ActivationError> {
        let now = Timestamp::now();
        let period = BillingPeriod::containing(now);
        let usage_path = paths::usage(user_id, period);

        let existing = self
            .read_existing::<SubscriptionRecord>(&paths::subscription(user_id))
            .await?;
        let existing_usage = self.read_existing::<UsageRecord>(&usage_path).await?;

        let subscription = SubscriptionRecord::free(existing.as_ref(), now);
        self.store
            .write(&paths::subscription(user_id), &subscription)
            .await?;

        let usage = UsageRecord::reset(Plan::Free, period, existing_usage.as_ref(), now);
        self.store.write(&usage_path, &usage).await?;

        self.store
            .update(&paths::metadata(user_id), metadata_fields(None, Plan::Free, now))
            .await?;

        self.mark_pending_purchase(user_id, PurchaseStatus::Failed, now)
            .await?;

        tracing::warn!(
            user_id = %user_id,
            previous_plan = existing.map(|r| r.plan.as_str()).unwrap_or("none"),
            "Activation rolled back to free plan"
        );
        Ok(())
    }

    /// Re-runs the activation recorded on the subscription when the
    /// records disagree.
    pub async fn repair_activation(
        &self,
        user_id: &UserId,
    ) -> Result<RepairOutcome, ActivationError> {
        if self.inspect_activation(user_id).await?.is_consistent() {
            return Ok(RepairOutcome::AlreadyConsistent);
        }

        let subscription = self
            .store
            .read::<SubscriptionRecord>(&paths::subscription(user_id))
            .await?
            .ok_or_else(|| ActivationError::NothingToRepair("no subscription record".to_string()))?;

        if !subscription.plan.is_paid() {
            return Err(ActivationError::NothingToRepair(
                "subscription is on the free plan".to_string(),
            ));
        }
        if subscription.subscription_status != SubscriptionStatus::Active {
            return Err(ActivationError::NothingToRepair(format!(
                "subscription is {}",
                subscription.subscription_status.as_str()
            )));
        }
        let subscription_id = subscription.subscription_id.clone().ok_or_else(|| {
            ActivationError::NothingToRepair("subscription has no subscription id".to_string())
        })?;

        tracing::info!(
            user_id = %user_id,
            plan = subscription.plan.as_str(),
            "Repairing inconsistent activation"
        );

        let cmd = ActivatePlanCommand {
            user_id: user_id.clone(),
            user_email: subscription.user_email.clone(),
            plan: subscription.plan.as_str().to_string(),
            subscription_id,
            source: subscription.subscription_source,
            amount: subscription.amount_paid,
        };
        self.activate_plan(cmd)
            .await
            .map(RepairOutcome::Repaired)
            .map_err(|failure| failure.error)
    }

    /// Moves the subscription to `status` if the transition is allowed.
    pub async fn set_subscription_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> Result<(), ActivationError> {
        let path = paths::subscription(user_id);
        let subscription = self
            .store
            .read::<SubscriptionRecord>(&path)
            .await?
            .ok_or_else(|| ActivationError::UserNotFound(user_id.to_string()))?;

        let next = subscription
            .subscription_status
            .transition_to(status)
            .map_err(|e| ActivationError::InvalidTransition(e.to_string()))?;

        let mut fields = Map::new();
        fields.insert("subscription_status".to_string(), json!(next));
        fields.insert("updated_at".to_string(), json!(Timestamp::now()));
        self.store.update(&path, fields).await?;

        tracing::info!(
            user_id = %user_id,
            from = subscription.subscription_status.as_str(),
            to = next.as_str(),
            "Subscription status changed"
        );
        Ok(())
    }

    /// Pending checkout record polled by the purchase success page.
    pub async fn pending_purchase(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PendingPurchase>, ActivationError> {
        Ok(self
            .store
            .read::<PendingPurchase>(&paths::pending_purchase(user_id))
            .await?)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Write sequence
    // ════════════════════════════════════════════════════════════════════════════

    async fn write_activation(
        &self,
        grant: &ActivationGrant,
        now: Timestamp,
        nodes: &mut Vec<ActivatedNode>,
    ) -> Result<(), ActivationError> {
        let user_id = &grant.user_id;
        let subscription_path = paths::subscription(user_id);
        let period = BillingPeriod::containing(now);
        let usage_path = paths::usage(user_id, period);

        let existing = self
            .read_existing::<SubscriptionRecord>(&subscription_path)
            .await?;
        let existing_usage = self.read_existing::<UsageRecord>(&usage_path).await?;

        let subscription = SubscriptionRecord::activated(grant, existing.as_ref(), now);
        self.store.write(&subscription_path, &subscription).await?;
        nodes.push(ActivatedNode::Subscription);

        let usage = UsageRecord::reset(grant.plan, period, existing_usage.as_ref(), now);
        self.store.write(&usage_path, &usage).await?;
        nodes.push(ActivatedNode::Usage);

        self.store
            .update(
                &paths::metadata(user_id),
                metadata_fields(Some(&grant.subscription_id), grant.plan, now),
            )
            .await?;
        nodes.push(ActivatedNode::Metadata);

        self.store.remove(&paths::pending_plan_change(user_id)).await?;
        self.mark_pending_purchase(user_id, PurchaseStatus::Completed, now)
            .await?;
        Ok(())
    }

    /// Reads a record that is about to be overwritten.
    ///
    /// An unreadable record only loses its `created_at`, so it is treated
    /// as absent rather than blocking the overwrite.
    async fn read_existing<T>(&self, path: &str) -> Result<Option<T>, ActivationError>
    where
        T: DeserializeOwned + Send,
    {
        match self.store.read::<T>(path).await {
            Ok(record) => Ok(record),
            Err(StoreError::Serialization { message, .. }) => {
                tracing::warn!(path, error = %message, "Overwriting unreadable record");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_pending_purchase(
        &self,
        user_id: &UserId,
        status: PurchaseStatus,
        now: Timestamp,
    ) -> Result<(), ActivationError> {
        let path = paths::pending_purchase(user_id);
        if self.store.get(&path).await?.is_none() {
            return Ok(());
        }
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(status));
        fields.insert("updated_at".to_string(), json!(now));
        self.store.update(&path, fields).await?;
        Ok(())
    }

    /// Stores the failure on an existing subscription record.
    async fn record_activation_error(
        &self,
        user_id: &UserId,
        error: &ActivationError,
        now: Timestamp,
    ) {
        let path = paths::subscription(user_id);
        let result = async {
            if self.store.get(&path).await?.is_none() {
                return Ok(());
            }
            let mut fields = Map::new();
            fields.insert(
                "last_activation_error".to_string(),
                Value::String(error.to_string()),
            );
            fields.insert("updated_at".to_string(), json!(now));
            self.store.update(&path, fields).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id = %user_id, error = %e, "Could not record activation error");
        }
    }
}

/// Merge fields for the metadata node; other keys on it are untouched.
fn metadata_fields(subscription_id: Option<&str>, plan: Plan, now: Timestamp) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "subscription_id".to_string(),
        subscription_id.map_or(Value::Null, |id| Value::String(id.to_string())),
    );
    fields.insert("plan".to_string(), json!(plan));
    fields.insert("updated_at".to_string(), json!(now));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::{FlakyDocumentStore, InMemoryDocumentStore};
    use crate::domain::subscription::{PlanLimits, SubscriptionSource};

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn command(plan: &str, subscription_id: &str, amount: Option<f64>) -> ActivatePlanCommand {
        ActivatePlanCommand {
            user_id: user(),
            user_email: Some("student@example.pk".to_string()),
            plan: plan.to_string(),
            subscription_id: subscription_id.to_string(),
            source: if amount == Some(0.0) {
                SubscriptionSource::PromoCode
            } else {
                SubscriptionSource::Whop
            },
            amount,
        }
    }

    fn service() -> (Arc<InMemoryDocumentStore>, PlanActivationService) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = PlanActivationService::new(store.clone());
        (store, service)
    }

    fn flaky_service() -> (
        Arc<FlakyDocumentStore<InMemoryDocumentStore>>,
        PlanActivationService,
    ) {
        let store = Arc::new(FlakyDocumentStore::new(InMemoryDocumentStore::new()));
        let service = PlanActivationService::new(store.clone());
        (store, service)
    }

    async fn subscription(store: &dyn DocumentStore) -> Option<SubscriptionRecord> {
        store.read(&paths::subscription(&user())).await.unwrap()
    }

    async fn current_usage(store: &dyn DocumentStore) -> Option<UsageRecord> {
        let period = BillingPeriod::containing(Timestamp::now());
        store.read(&paths::usage(&user(), period)).await.unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // activate_plan
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn zero_dollar_pro_activation_grants_pro_limits() {
        let (store, service) = service();

        let receipt = service
            .activate_plan(command("pro", "mem_1", Some(0.0)))
            .await
            .unwrap();

        assert_eq!(receipt.plan, Plan::Pro);
        assert_eq!(receipt.tokens_limit, 1_000_000);
        assert_eq!(receipt.quizzes_limit, 200);
        assert_eq!(receipt.activated_nodes, ActivatedNode::ORDER.to_vec());

        let record = subscription(store.as_ref()).await.unwrap();
        assert_eq!(record.subscription_source, SubscriptionSource::PromoCode);
        assert_eq!(record.amount_paid, Some(0.0));
        assert!(service.verify_activation(&user()).await);
    }

    #[tokio::test]
    async fn activation_mirrors_plan_into_usage_and_metadata() {
        let (store, service) = service();
        store
            .set("users/u1/metadata", json!({"display_name": "Ayesha"}))
            .await
            .unwrap();

        service
            .activate_plan(command("premium", "mem_1", Some(19.99)))
            .await
            .unwrap();

        let usage = current_usage(store.as_ref()).await.unwrap();
        assert_eq!(usage.plan, Plan::Premium);
        assert_eq!(usage.tokens_limit, PlanLimits::for_plan(Plan::Premium).tokens);

        let metadata = store.get("users/u1/metadata").await.unwrap().unwrap();
        assert_eq!(metadata["plan"], "premium");
        assert_eq!(metadata["subscription_id"], "mem_1");
        assert_eq!(metadata["display_name"], "Ayesha");
    }

    #[tokio::test]
    async fn reactivation_in_same_month_keeps_usage_created_at() {
        let (store, service) = service();
        service
            .activate_plan(command("basic", "mem_1", Some(4.99)))
            .await
            .unwrap();

        let mut usage = current_usage(store.as_ref()).await.unwrap();
        let period = BillingPeriod { year: usage.year, month: usage.month };
        let started = usage.created_at.add_days(-3);
        usage.created_at = started;
        usage.tokens_used = 9_000;
        store.write(&paths::usage(&user(), period), &usage).await.unwrap();

        service
            .activate_plan(command("pro", "mem_2", Some(9.99)))
            .await
            .unwrap();

        let usage = current_usage(store.as_ref()).await.unwrap();
        assert_eq!(usage.created_at, started);
        assert_eq!(usage.plan, Plan::Pro);
        assert_eq!(usage.tokens_used, 0);
    }

    #[tokio::test]
    async fn invalid_plan_writes_nothing() {
        let (store, service) = service();

        let failure = service
            .activate_plan(command("enterprise", "mem_1", Some(5.0)))
            .await
            .unwrap_err();

        assert_eq!(failure.error, ActivationError::InvalidPlan("enterprise".to_string()));
        assert!(failure.activated_nodes.is_empty());
        assert_eq!(store.snapshot().await, json!({}));
    }

    #[tokio::test]
    async fn last_activation_wins_and_counters_reset() {
        let (store, service) = service();

        service
            .activate_plan(command("basic", "mem_1", Some(4.99)))
            .await
            .unwrap();
        store
            .update(
                "users/u1/subscription",
                Map::from_iter([("tokens_used".to_string(), json!(1234))]),
            )
            .await
            .unwrap();
        service
            .activate_plan(command("pro", "mem_2", Some(9.99)))
            .await
            .unwrap();

        let record = subscription(store.as_ref()).await.unwrap();
        assert_eq!(record.plan, Plan::Pro);
        assert_eq!(record.subscription_id.as_deref(), Some("mem_2"));
        assert_eq!(record.tokens_used, 0);
        assert_eq!(record.quizzes_used, 0);
        assert_eq!(record.activation_attempts, 2);
    }

    #[tokio::test]
    async fn repeated_activation_converges() {
        let (store, service) = service();
        let cmd = command("pro", "mem_1", Some(9.99));

        service.activate_plan(cmd.clone()).await.unwrap();
        let first = subscription(store.as_ref()).await.unwrap();
        service.activate_plan(cmd).await.unwrap();
        let second = subscription(store.as_ref()).await.unwrap();

        assert_eq!(first.plan, second.plan);
        assert_eq!(first.tokens_limit, second.tokens_limit);
        assert_eq!(first.subscription_id, second.subscription_id);
        assert_eq!(first.created_at, second.created_at);
        assert!(service.verify_activation(&user()).await);
    }

    #[tokio::test]
    async fn activation_clears_pending_plan_change_and_completes_purchase() {
        let (store, service) = service();
        store
            .set("users/u1/pending_plan_change", json!({"to": "pro"}))
            .await
            .unwrap();
        store
            .set("pending_purchases/u1", json!({"status": "processing", "plan": "pro"}))
            .await
            .unwrap();

        service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap();

        assert!(store.get("users/u1/pending_plan_change").await.unwrap().is_none());
        let purchase = service.pending_purchase(&user()).await.unwrap().unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(purchase.plan, Some(Plan::Pro));
    }

    #[tokio::test]
    async fn activation_without_pending_purchase_does_not_create_one() {
        let (store, service) = service();
        service
            .activate_plan(command("basic", "mem_1", None))
            .await
            .unwrap();
        assert!(store.get("pending_purchases/u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_failure_reports_written_nodes_and_records_error() {
        let (store, service) = flaky_service();
        store.fail_writes("users/u1/metadata", None);

        let failure = service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap_err();

        assert!(failure.error.is_retryable());
        assert_eq!(
            failure.activated_nodes,
            vec![ActivatedNode::Subscription, ActivatedNode::Usage]
        );

        let record = subscription(store.inner()).await.unwrap();
        assert!(record
            .last_activation_error
            .as_deref()
            .unwrap()
            .contains("injected failure"));
        assert!(!service.verify_activation(&user()).await);
    }

    #[tokio::test]
    async fn failure_on_first_write_reports_no_nodes() {
        let (store, service) = flaky_service();
        store.fail_writes("users/u1/subscription", Some(1));

        let failure = service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap_err();

        assert!(failure.activated_nodes.is_empty());
        assert!(subscription(store.inner()).await.is_none());
    }

    #[tokio::test]
    async fn rerun_after_partial_failure_verifies() {
        let (store, service) = flaky_service();
        store.fail_writes("usage/", Some(1));

        assert!(service
            .activate_plan(command("basic", "mem_1", Some(4.99)))
            .await
            .is_err());
        service
            .activate_plan(command("basic", "mem_1", Some(4.99)))
            .await
            .unwrap();

        assert!(service.verify_activation(&user()).await);
        let record = subscription(store.inner()).await.unwrap();
        assert!(record.last_activation_error.is_none());
    }

    #[tokio::test]
    async fn unreadable_existing_record_is_overwritten() {
        let (store, service) = service();
        store
            .set("users/u1/subscription", json!({"last_activation_error": "x"}))
            .await
            .unwrap();

        service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap();

        assert!(service.verify_activation(&user()).await);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // verify / inspect
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn inspect_reports_missing_subscription() {
        let (_store, service) = service();
        let check = service.inspect_activation(&user()).await.unwrap();
        assert_eq!(check.mismatches, vec![Mismatch::SubscriptionMissing]);
        assert!(!service.verify_activation(&user()).await);
    }

    #[tokio::test]
    async fn inspect_reports_each_disagreement() {
        let (store, service) = service();
        service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap();
        let period = BillingPeriod::containing(Timestamp::now());
        store
            .update(
                &paths::usage(&user(), period),
                Map::from_iter([("plan".to_string(), json!("basic"))]),
            )
            .await
            .unwrap();
        store.remove("users/u1/metadata").await.unwrap();

        let check = service.inspect_activation(&user()).await.unwrap();

        assert_eq!(
            check.mismatches,
            vec![
                Mismatch::UsagePlan {
                    expected: Plan::Pro,
                    found: Plan::Basic
                },
                Mismatch::MetadataMissing,
            ]
        );
    }

    #[tokio::test]
    async fn verify_is_false_when_reads_fail() {
        let (store, service) = flaky_service();
        service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap();
        store.fail_reads("usage/", None);

        assert!(!service.verify_activation(&user()).await);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // rollback / repair / status
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn rollback_returns_user_to_free_plan() {
        let (store, service) = service();
        store
            .set("pending_purchases/u1", json!({"status": "processing"}))
            .await
            .unwrap();
        service
            .activate_plan(command("premium", "mem_1", Some(19.99)))
            .await
            .unwrap();
        let activated = subscription(store.as_ref()).await.unwrap();

        service.rollback_activation(&user()).await.unwrap();

        let record = subscription(store.as_ref()).await.unwrap();
        let free = PlanLimits::for_plan(Plan::Free);
        assert_eq!(record.plan, Plan::Free);
        assert_eq!(record.tokens_limit, free.tokens);
        assert_eq!(record.quizzes_limit, free.quizzes);
        assert_eq!(record.subscription_status, SubscriptionStatus::Active);
        assert_eq!(record.subscription_source, SubscriptionSource::Admin);
        assert!(record.subscription_id.is_none());
        assert_eq!(record.created_at, activated.created_at);

        let usage = current_usage(store.as_ref()).await.unwrap();
        assert_eq!(usage.plan, Plan::Free);

        let metadata = store.get("users/u1/metadata").await.unwrap().unwrap();
        assert_eq!(metadata["plan"], "free");
        assert!(metadata.get("subscription_id").is_none());

        let purchase = service.pending_purchase(&user()).await.unwrap().unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Failed);
        assert!(service.verify_activation(&user()).await);
    }

    #[tokio::test]
    async fn repair_reports_consistent_records() {
        let (_store, service) = service();
        service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap();

        assert_eq!(
            service.repair_activation(&user()).await.unwrap(),
            RepairOutcome::AlreadyConsistent
        );
    }

    #[tokio::test]
    async fn repair_rewrites_from_subscription_record() {
        let (store, service) = service();
        service
            .activate_plan(command("pro", "mem_1", Some(0.0)))
            .await
            .unwrap();
        store.remove("usage/u1").await.unwrap();

        let outcome = service.repair_activation(&user()).await.unwrap();

        match outcome {
            RepairOutcome::Repaired(receipt) => assert_eq!(receipt.plan, Plan::Pro),
            other => panic!("expected repair, got {:?}", other),
        }
        let record = subscription(store.as_ref()).await.unwrap();
        assert_eq!(record.subscription_source, SubscriptionSource::PromoCode);
        assert!(service.verify_activation(&user()).await);
    }

    #[tokio::test]
    async fn repair_without_record_has_nothing_to_do() {
        let (_store, service) = service();
        assert!(matches!(
            service.repair_activation(&user()).await,
            Err(ActivationError::NothingToRepair(_))
        ));
    }

    #[tokio::test]
    async fn repair_refuses_cancelled_subscription() {
        let (_store, service) = service();
        service
            .activate_plan(command("pro", "mem_1", Some(9.99)))
            .await
            .unwrap();
        service
            .set_subscription_status(&user(), SubscriptionStatus::Cancelled)
            .await
            .unwrap();

        assert!(matches!(
            service.repair_activation(&user()).await,
            Err(ActivationError::NothingToRepair(_))
        ));
    }

    #[tokio::test]
    async fn cancellation_flips_status_only() {
        let (store, service) = service();
        service
            .activate_plan(command("basic", "mem_1", Some(4.99)))
            .await
            .unwrap();

        service
            .set_subscription_status(&user(), SubscriptionStatus::Cancelled)
            .await
            .unwrap();

        let record = subscription(store.as_ref()).await.unwrap();
        assert_eq!(record.subscription_status, SubscriptionStatus::Cancelled);
        assert_eq!(record.plan, Plan::Basic);
        assert_eq!(record.subscription_id.as_deref(), Some("mem_1"));
    }

    #[tokio::test]
    async fn expired_subscription_cannot_be_cancelled() {
        let (_store, service) = service();
        service
            .activate_plan(command("basic", "mem_1", Some(4.99)))
            .await
            .unwrap();
        service
            .set_subscription_status(&user(), SubscriptionStatus::Expired)
            .await
            .unwrap();

        assert!(matches!(
            service
                .set_subscription_status(&user(), SubscriptionStatus::Cancelled)
                .await,
            Err(ActivationError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn status_change_without_record_is_user_not_found() {
        let (_store, service) = service();
        assert_eq!(
            service
                .set_subscription_status(&user(), SubscriptionStatus::Cancelled)
                .await,
            Err(ActivationError::UserNotFound("u1".to_string()))
        );
    }
}
