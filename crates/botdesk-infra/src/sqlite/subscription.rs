//! SQLite subscription repository implementation.
//!
//! Implements `SubscriptionRepository` from `botdesk-core` using sqlx with
//! split read/write pools. One row per tenant, keyed by tenant id; writes
//! come only from the billing webhook handler.

use botdesk_core::billing::SubscriptionRepository;
use botdesk_types::billing::{Plan, Subscription, SubscriptionStatus};
use botdesk_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `SubscriptionRepository`.
pub struct SqliteSubscriptionRepository {
    pool: DatabasePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to the domain Subscription.
struct SubscriptionRow {
    tenant_id: String,
    status: String,
    plan: String,
    trial_ends_at: Option<String>,
    processor_subscription_id: Option<String>,
    processor_customer_id: Option<String>,
    activated_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SubscriptionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tenant_id: row.try_get("tenant_id")?,
            status: row.try_get("status")?,
            plan: row.try_get("plan")?,
            trial_ends_at: row.try_get("trial_ends_at")?,
            processor_subscription_id: row.try_get("processor_subscription_id")?,
            processor_customer_id: row.try_get("processor_customer_id")?,
            activated_at: row.try_get("activated_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_subscription(self) -> Result<Subscription, RepositoryError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| RepositoryError::Query(format!("invalid tenant id: {e}")))?;

        let status: SubscriptionStatus =
            self.status.parse().map_err(RepositoryError::Query)?;
        let plan: Plan = self.plan.parse().map_err(RepositoryError::Query)?;

        Ok(Subscription {
            tenant_id,
            status,
            plan,
            trial_ends_at: self.trial_ends_at.as_deref().map(parse_datetime).transpose()?,
            processor_subscription_id: self.processor_subscription_id,
            processor_customer_id: self.processor_customer_id,
            activated_at: self.activated_at.as_deref().map(parse_datetime).transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn get_subscription(
        &self,
        tenant_id: &Uuid,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM subscriptions WHERE tenant_id = ?")
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let sub_row = SubscriptionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(sub_row.into_subscription()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO subscriptions (tenant_id, status, plan, trial_ends_at, processor_subscription_id, processor_customer_id, activated_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(tenant_id) DO UPDATE SET
                status = excluded.status,
                plan = excluded.plan,
                trial_ends_at = excluded.trial_ends_at,
                processor_subscription_id = excluded.processor_subscription_id,
                processor_customer_id = excluded.processor_customer_id,
                activated_at = excluded.activated_at,
                updated_at = excluded.updated_at",
        )
        .bind(subscription.tenant_id.to_string())
        .bind(subscription.status.to_string())
        .bind(subscription.plan.to_string())
        .bind(subscription.trial_ends_at.as_ref().map(format_datetime))
        .bind(&subscription.processor_subscription_id)
        .bind(&subscription.processor_customer_id)
        .bind(subscription.activated_at.as_ref().map(format_datetime))
        .bind(format_datetime(&subscription.created_at))
        .bind(format_datetime(&subscription.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn set_status_by_processor_id(
        &self,
        processor_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = ?, updated_at = ? WHERE processor_subscription_id = ?",
        )
        .bind(status.to_string())
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(processor_subscription_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
