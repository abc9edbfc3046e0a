//! ConversationRepository trait definition.

use botdesk_types::conversation::{Conversation, StoredMessage};
use botdesk_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversations and their message rows.
pub trait ConversationRepository: Send + Sync {
    /// Fetch one conversation by id.
    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Insert a new conversation row.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All conversations for a tenant, newest first.
    fn list_conversations(
        &self,
        tenant_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Append a message row to a conversation.
    fn save_message(
        &self,
        message: &StoredMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Messages of one conversation in insertion order.
    fn get_messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Bump a conversation's updated_at to now.
    fn touch(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
