//! Per-tenant widget persona configuration.
//!
//! A missing row is the normal "use defaults" case, not an error. The
//! default strings match what the widget ships with before onboarding
//! completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bot display name used when the tenant has not configured one.
pub const DEFAULT_BOT_NAME: &str = "BotDesk AI";

/// Greeting seeded as the first assistant message in a fresh widget session.
pub const DEFAULT_GREETING: &str = "Hi! \u{1F44B} How can I help you today?";

/// System prompt used when the tenant has no configured persona.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are BotDesk AI, a friendly and helpful \
customer support chatbot. You help visitors with their questions about the business. \
Keep responses concise, professional, and helpful.";

/// Tenant-configured widget persona: display name, greeting, system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetSettings {
    pub tenant_id: Uuid,
    pub bot_name: String,
    pub greeting_message: String,
    /// Custom persona text; `None` or empty falls back to the default.
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WidgetSettings {
    /// Default settings row seeded when a subscription activates.
    pub fn defaults_for(tenant_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            tenant_id,
            bot_name: DEFAULT_BOT_NAME.to_string(),
            greeting_message: DEFAULT_GREETING.to_string(),
            system_prompt: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = WidgetSettings::defaults_for(Uuid::now_v7());
        assert_eq!(settings.bot_name, DEFAULT_BOT_NAME);
        assert_eq!(settings.greeting_message, DEFAULT_GREETING);
        assert!(settings.system_prompt.is_none());
    }
}
