//! SQLite widget settings repository implementation.

use botdesk_core::widget::WidgetSettingsRepository;
use botdesk_types::error::RepositoryError;
use botdesk_types::widget::WidgetSettings;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `WidgetSettingsRepository`.
pub struct SqliteWidgetSettingsRepository {
    pool: DatabasePool,
}

impl SqliteWidgetSettingsRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct SettingsRow {
    tenant_id: String,
    bot_name: String,
    greeting_message: String,
    system_prompt: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SettingsRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tenant_id: row.try_get("tenant_id")?,
            bot_name: row.try_get("bot_name")?,
            greeting_message: row.try_get("greeting_message")?,
            system_prompt: row.try_get("system_prompt")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_settings(self) -> Result<WidgetSettings, RepositoryError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| RepositoryError::Query(format!("invalid tenant id: {e}")))?;

        Ok(WidgetSettings {
            tenant_id,
            bot_name: self.bot_name,
            greeting_message: self.greeting_message,
            system_prompt: self.system_prompt,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl WidgetSettingsRepository for SqliteWidgetSettingsRepository {
    async fn get_settings(
        &self,
        tenant_id: &Uuid,
    ) -> Result<Option<WidgetSettings>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM widget_settings WHERE tenant_id = ?")
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let settings_row = SettingsRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(settings_row.into_settings()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_settings(&self, settings: &WidgetSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO widget_settings (tenant_id, bot_name, greeting_message, system_prompt, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(tenant_id) DO UPDATE SET
                bot_name = excluded.bot_name,
                greeting_message = excluded.greeting_message,
                system_prompt = excluded.system_prompt,
                updated_at = excluded.updated_at",
        )
        .bind(settings.tenant_id.to_string())
        .bind(&settings.bot_name)
        .bind(&settings.greeting_message)
        .bind(&settings.system_prompt)
        .bind(format_datetime(&settings.created_at))
        .bind(format_datetime(&settings.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn ensure_defaults(&self, tenant_id: &Uuid) -> Result<(), RepositoryError> {
        let defaults = WidgetSettings::defaults_for(*tenant_id);

        // OR IGNORE: an existing row keeps the tenant's own configuration.
        sqlx::query(
            "INSERT OR IGNORE INTO widget_settings (tenant_id, bot_name, greeting_message, system_prompt, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(defaults.tenant_id.to_string())
        .bind(&defaults.bot_name)
        .bind(&defaults.greeting_message)
        .bind(&defaults.system_prompt)
        .bind(format_datetime(&defaults.created_at))
        .bind(format_datetime(&defaults.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
