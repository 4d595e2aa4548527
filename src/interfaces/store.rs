use async_trait::async_trait;

use crate::domains::chat::{Chat, Message};
use crate::domains::memory::LongTermMemory;
use crate::domains::relationship::Relationship;
use crate::error::Result;

/// Narrow persistence port the orchestrator consumes. The two turn
/// phases are single transactions: everything inside a phase commits or
/// rolls back together.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_chat_by_user_character(
        &self,
        user_id: &str,
        character_id: &str,
    ) -> Result<Option<Chat>>;

    async fn find_chat(&self, chat_id: &str) -> Result<Option<Chat>>;

    /// Creates the chat, its relationship row and, when present, the
    /// welcome message (counted in the chat counters) in one transaction.
    async fn create_chat(
        &self,
        chat: &Chat,
        relationship: &Relationship,
        welcome: Option<&Message>,
    ) -> Result<()>;

    async fn find_message(&self, message_id: &str) -> Result<Option<Message>>;

    /// Newest first; callers reverse for chronological order.
    async fn list_recent_messages(&self, chat_id: &str, limit: i64) -> Result<Vec<Message>>;

    async fn find_relationship_by_chat(&self, chat_id: &str) -> Result<Option<Relationship>>;

    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()>;

    /// Phase 1: insert the user message and bump the chat counters.
    async fn save_user_turn(&self, message: &Message) -> Result<()>;

    /// Phase 2: insert the assistant message, bump the chat counters,
    /// upsert the relationship and save the memory aggregate.
    async fn save_assistant_turn(
        &self,
        message: &Message,
        relationship: &Relationship,
        memory: &LongTermMemory,
    ) -> Result<()>;

    async fn load_long_term_memory(
        &self,
        user_id: &str,
        character_id: &str,
    ) -> Result<Option<LongTermMemory>>;

    async fn save_long_term_memory(&self, memory: &LongTermMemory) -> Result<()>;
}
