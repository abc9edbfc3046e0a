//! SubscriptionRepository trait definition.
//!
//! Implementations live in botdesk-infra (e.g., `SqliteSubscriptionRepository`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use botdesk_types::billing::{Subscription, SubscriptionStatus};
use botdesk_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for tenant subscription rows.
///
/// The relay path only reads; writes come from the billing webhook.
pub trait SubscriptionRepository: Send + Sync {
    /// Fetch the subscription for a tenant, if any.
    fn get_subscription(
        &self,
        tenant_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Subscription>, RepositoryError>> + Send;

    /// Insert or replace a tenant's subscription row.
    fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Update the status of the subscription carrying the given processor id.
    ///
    /// Used by the cancellation webhook, which identifies the subscription
    /// by the processor's id rather than the tenant's.
    fn set_status_by_processor_id(
        &self,
        processor_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
