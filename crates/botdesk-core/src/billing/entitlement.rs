//! Per-request entitlement check against tenant billing state.
//!
//! Evaluated on every relay call: entitlement can flip mid-session when the
//! billing webhook lands, so nothing is cached here. The check fails closed:
//! a repository error degrades to "not entitled" for that tenant rather than
//! failing the relay with a hard error.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::billing::repository::SubscriptionRepository;

/// Answers whether a tenant's widget may serve AI responses right now.
pub struct EntitlementGate<S: SubscriptionRepository> {
    subscriptions: S,
}

impl<S: SubscriptionRepository> EntitlementGate<S> {
    pub fn new(subscriptions: S) -> Self {
        Self { subscriptions }
    }

    /// True iff the tenant has a serviceable subscription: status in
    /// {active, trialing} and, for trial plans, a trial end in the future.
    ///
    /// Returns false (never an error) for a missing row, a non-serviceable
    /// status, an expired trial, or a failed lookup.
    pub async fn is_active(&self, tenant_id: &Uuid) -> bool {
        match self.subscriptions.get_subscription(tenant_id).await {
            Ok(Some(subscription)) => subscription.entitles_at(Utc::now()),
            Ok(None) => false,
            Err(err) => {
                warn!(tenant_id = %tenant_id, error = %err, "subscription lookup failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botdesk_types::billing::{Plan, Subscription, SubscriptionStatus};
    use botdesk_types::error::RepositoryError;
    use chrono::{DateTime, Duration, Utc};

    /// In-memory repository returning a fixed answer.
    struct FixedRepo(Result<Option<Subscription>, ()>);

    impl SubscriptionRepository for FixedRepo {
        async fn get_subscription(
            &self,
            _tenant_id: &Uuid,
        ) -> Result<Option<Subscription>, RepositoryError> {
            match &self.0 {
                Ok(sub) => Ok(sub.clone()),
                Err(()) => Err(RepositoryError::Connection),
            }
        }

        async fn upsert_subscription(
            &self,
            _subscription: &Subscription,
        ) -> Result<(), RepositoryError> {
            unimplemented!("not used by the gate")
        }

        async fn set_status_by_processor_id(
            &self,
            _processor_subscription_id: &str,
            _status: SubscriptionStatus,
        ) -> Result<(), RepositoryError> {
            unimplemented!("not used by the gate")
        }
    }

    fn subscription(
        status: SubscriptionStatus,
        plan: Plan,
        trial_ends_at: Option<DateTime<Utc>>,
    ) -> Subscription {
        let now = Utc::now();
        Subscription {
            tenant_id: Uuid::now_v7(),
            status,
            plan,
            trial_ends_at,
            processor_subscription_id: None,
            processor_customer_id: None,
            activated_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_active_subscription_is_entitled() {
        let gate = EntitlementGate::new(FixedRepo(Ok(Some(subscription(
            SubscriptionStatus::Active,
            Plan::Growth,
            None,
        )))));
        assert!(gate.is_active(&Uuid::now_v7()).await);
    }

    #[tokio::test]
    async fn test_future_trial_is_entitled() {
        let gate = EntitlementGate::new(FixedRepo(Ok(Some(subscription(
            SubscriptionStatus::Trialing,
            Plan::Trial,
            Some(Utc::now() + Duration::days(7)),
        )))));
        assert!(gate.is_active(&Uuid::now_v7()).await);
    }

    #[tokio::test]
    async fn test_expired_trial_is_denied() {
        let gate = EntitlementGate::new(FixedRepo(Ok(Some(subscription(
            SubscriptionStatus::Trialing,
            Plan::Trial,
            Some(Utc::now() - Duration::hours(1)),
        )))));
        assert!(!gate.is_active(&Uuid::now_v7()).await);
    }

    #[tokio::test]
    async fn test_missing_row_is_denied() {
        let gate = EntitlementGate::new(FixedRepo(Ok(None)));
        assert!(!gate.is_active(&Uuid::now_v7()).await);
    }

    #[tokio::test]
    async fn test_canceled_is_denied() {
        let gate = EntitlementGate::new(FixedRepo(Ok(Some(subscription(
            SubscriptionStatus::Canceled,
            Plan::Starter,
            None,
        )))));
        assert!(!gate.is_active(&Uuid::now_v7()).await);
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_closed() {
        let gate = EntitlementGate::new(FixedRepo(Err(())));
        assert!(!gate.is_active(&Uuid::now_v7()).await);
    }
}
