//! Persona resolution: configured system prompt with a fixed fallback.
//!
//! Missing configuration is the normal case for new tenants, never an
//! error. Lookup failures also fall back to the defaults so a data-store
//! hiccup cannot break an otherwise-authorized chat.

use tracing::warn;
use uuid::Uuid;

use botdesk_types::widget::{DEFAULT_BOT_NAME, DEFAULT_GREETING, DEFAULT_SYSTEM_PROMPT};

use crate::widget::repository::WidgetSettingsRepository;

/// Display strings embedded into the generated widget script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetBranding {
    pub bot_name: String,
    pub greeting: String,
}

impl Default for WidgetBranding {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

/// Resolves a tenant's persona text and widget branding.
pub struct PersonaResolver<W: WidgetSettingsRepository> {
    settings: W,
}

impl<W: WidgetSettingsRepository> PersonaResolver<W> {
    pub fn new(settings: W) -> Self {
        Self { settings }
    }

    /// The system prompt to prepend for this tenant.
    ///
    /// A configured, non-empty prompt wins; everything else (no row, empty
    /// prompt, lookup failure) resolves to the fixed default.
    pub async fn resolve(&self, tenant_id: &Uuid) -> String {
        match self.settings.get_settings(tenant_id).await {
            Ok(Some(settings)) => settings
                .system_prompt
                .filter(|prompt| !prompt.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            Ok(None) => DEFAULT_SYSTEM_PROMPT.to_string(),
            Err(err) => {
                warn!(tenant_id = %tenant_id, error = %err, "settings lookup failed, using default persona");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }

    /// Bot name and greeting for the generated widget script, with the same
    /// fall-back-to-default semantics as [`Self::resolve`].
    pub async fn branding(&self, tenant_id: &Uuid) -> WidgetBranding {
        match self.settings.get_settings(tenant_id).await {
            Ok(Some(settings)) => WidgetBranding {
                bot_name: non_empty_or(settings.bot_name, DEFAULT_BOT_NAME),
                greeting: non_empty_or(settings.greeting_message, DEFAULT_GREETING),
            },
            Ok(None) => WidgetBranding::default(),
            Err(err) => {
                warn!(tenant_id = %tenant_id, error = %err, "settings lookup failed, using default branding");
                WidgetBranding::default()
            }
        }
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
