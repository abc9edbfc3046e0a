//! Persisted conversation and message types for the tenant dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::chat::MessageRole;

/// Lifecycle status of a visitor conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Escalated,
    Closed,
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationStatus::Active => write!(f, "active"),
            ConversationStatus::Escalated => write!(f, "escalated"),
            ConversationStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ConversationStatus::Active),
            "escalated" => Ok(ConversationStatus::Escalated),
            "closed" => Ok(ConversationStatus::Closed),
            other => Err(format!("invalid conversation status: '{other}'")),
        }
    }
}

/// A conversation between a visitor and a tenant's widget.
///
/// Created lazily on the first recorded exchange of a session. The visitor
/// name starts as a placeholder until the visitor identifies themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub visitor_name: String,
    pub visitor_email: Option<String>,
    pub status: ConversationStatus,
    /// 1-5, set from the post-chat survey when present.
    pub satisfaction_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh active conversation with the placeholder visitor name.
    pub fn new(id: Uuid, tenant_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            tenant_id,
            visitor_name: "Visitor".to_string(),
            visitor_email: None,
            status: ConversationStatus::Active,
            satisfaction_rating: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single persisted message within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
