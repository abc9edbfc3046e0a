//! WidgetSettingsRepository trait definition.
//!
//! Follows the same RPITIT pattern as SubscriptionRepository; the SQLite
//! implementation lives in botdesk-infra.

use botdesk_types::error::RepositoryError;
use botdesk_types::widget::WidgetSettings;
use uuid::Uuid;

/// Repository trait for per-tenant widget persona settings.
pub trait WidgetSettingsRepository: Send + Sync {
    /// Fetch the settings row for a tenant, if any.
    fn get_settings(
        &self,
        tenant_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<WidgetSettings>, RepositoryError>> + Send;

    /// Insert or replace a tenant's settings row.
    fn upsert_settings(
        &self,
        settings: &WidgetSettings,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Seed a default settings row unless one already exists.
    ///
    /// Called when a subscription activates so the widget has branding
    /// before onboarding completes.
    fn ensure_defaults(
        &self,
        tenant_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
