//! Dashboard read endpoints for recorded conversations.
//!
//! GET /api/v1/conversations
//! GET /api/v1/conversations/{id}/messages
//!
//! Both are API-key protected; the key's tenant scopes every read.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use botdesk_core::conversation::ConversationRepository;
use botdesk_types::conversation::{Conversation, StoredMessage};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// GET /api/v1/conversations — the tenant's conversations, newest first.
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conversations = state.conversations.list_conversations(&auth.tenant_id).await?;
    Ok(Json(conversations))
}

/// GET /api/v1/conversations/{id}/messages — one conversation's transcript,
/// chronological. A conversation belonging to another tenant reads as
/// missing, never as forbidden.
pub async fn get_conversation_messages(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StoredMessage>>, AppError> {
    let conversation = state
        .conversations
        .get_conversation(&id)
        .await?
        .filter(|c| c.tenant_id == auth.tenant_id)
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    let messages = state.conversations.get_messages(&conversation.id).await?;
    Ok(Json(messages))
}
