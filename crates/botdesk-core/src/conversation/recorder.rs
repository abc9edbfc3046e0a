//! Server-side transcript recording for relayed exchanges.
//!
//! Runs after a relay round completes, off the streaming path: recording
//! failures are reported to the caller for logging but must never affect
//! the bytes already delivered to the visitor.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use botdesk_types::chat::MessageRole;
use botdesk_types::conversation::{Conversation, StoredMessage};
use botdesk_types::error::RepositoryError;

use crate::conversation::repository::ConversationRepository;

/// Persists one user/assistant exchange per relay round.
pub struct TranscriptRecorder<C: ConversationRepository> {
    conversations: C,
}

impl<C: ConversationRepository> TranscriptRecorder<C> {
    pub fn new(conversations: C) -> Self {
        Self { conversations }
    }

    /// Record one exchange, returning the conversation id it landed in.
    ///
    /// Reuses the caller-supplied conversation when it exists and belongs to
    /// the tenant; otherwise creates a conversation under that id (or a fresh
    /// one when none was supplied) so a widget page session maps to a single
    /// conversation across rounds.
    pub async fn record(
        &self,
        tenant_id: &Uuid,
        conversation_id: Option<Uuid>,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<Uuid, RepositoryError> {
        let conversation_id = self.resolve_conversation(tenant_id, conversation_id).await?;

        self.conversations
            .save_message(&message(conversation_id, MessageRole::User, user_text))
            .await?;
        self.conversations
            .save_message(&message(conversation_id, MessageRole::Assistant, assistant_text))
            .await?;
        self.conversations.touch(&conversation_id).await?;

        debug!(conversation_id = %conversation_id, "recorded exchange");
        Ok(conversation_id)
    }

    async fn resolve_conversation(
        &self,
        tenant_id: &Uuid,
        requested: Option<Uuid>,
    ) -> Result<Uuid, RepositoryError> {
        if let Some(id) = requested {
            match self.conversations.get_conversation(&id).await? {
                Some(existing) if existing.tenant_id == *tenant_id => return Ok(id),
                // A foreign id never attaches to another tenant's thread.
                Some(_) => {}
                None => {
                    let conversation = Conversation::new(id, *tenant_id);
                    self.conversations.create_conversation(&conversation).await?;
                    return Ok(id);
                }
            }
        }

        let conversation = Conversation::new(Uuid::now_v7(), *tenant_id);
        self.conversations.create_conversation(&conversation).await?;
        Ok(conversation.id)
    }
}

fn message(conversation_id: Uuid, role: MessageRole, content: &str) -> StoredMessage {
    StoredMessage {
        id: Uuid::now_v7(),
        conversation_id,
        role,
        content: content.to_string(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemoryRepo {
        conversations: Arc<Mutex<Vec<Conversation>>>,
        messages: Arc<Mutex<Vec<StoredMessage>>>,
    }

    impl ConversationRepository for MemoryRepo {
        async fn get_conversation(
            &self,
            id: &Uuid,
        ) -> Result<Option<Conversation>, RepositoryError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == *id)
                .cloned())
        }

        async fn create_conversation(
            &self,
            conversation: &Conversation,
        ) -> Result<(), RepositoryError> {
            self.conversations.lock().unwrap().push(conversation.clone());
            Ok(())
        }

        async fn list_conversations(
            &self,
            tenant_id: &Uuid,
        ) -> Result<Vec<Conversation>, RepositoryError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.tenant_id == *tenant_id)
                .cloned()
                .collect())
        }

        async fn save_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn get_messages(
            &self,
            conversation_id: &Uuid,
        ) -> Result<Vec<StoredMessage>, RepositoryError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.conversation_id == *conversation_id)
                .cloned()
                .collect())
        }

        async fn touch(&self, _conversation_id: &Uuid) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_creates_conversation_and_two_messages() {
        let repo = MemoryRepo::default();
        let recorder = TranscriptRecorder::new(repo.clone());
        let tenant = Uuid::now_v7();

        let id = recorder
            .record(&tenant, None, "Hello", "Hi there!")
            .await
            .unwrap();

        let messages = repo.get_messages(&id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "Hi there!");
        assert_eq!(repo.list_conversations(&tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_conversation_id_reused_across_rounds() {
        let repo = MemoryRepo::default();
        let recorder = TranscriptRecorder::new(repo.clone());
        let tenant = Uuid::now_v7();
        let page_session = Uuid::now_v7();

        let first = recorder
            .record(&tenant, Some(page_session), "First?", "First answer")
            .await
            .unwrap();
        let second = recorder
            .record(&tenant, Some(page_session), "Second?", "Second answer")
            .await
            .unwrap();

        assert_eq!(first, page_session);
        assert_eq!(second, page_session);
        assert_eq!(repo.list_conversations(&tenant).await.unwrap().len(), 1);
        assert_eq!(repo.get_messages(&page_session).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_foreign_tenant_conversation_not_attached() {
        let repo = MemoryRepo::default();
        let recorder = TranscriptRecorder::new(repo.clone());
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();

        let theirs = recorder
            .record(&owner, None, "mine", "yes")
            .await
            .unwrap();
        let got = recorder
            .record(&intruder, Some(theirs), "sneaky", "ok")
            .await
            .unwrap();

        assert_ne!(got, theirs);
        assert_eq!(repo.get_messages(&theirs).await.unwrap().len(), 2);
    }
}
