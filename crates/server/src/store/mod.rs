//! Conversation storage
//!
//! Owns users, conversations and messages. Components receive the store as
//! an `Arc<dyn ConversationStore>`; the backend is chosen at startup.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::models::{Conversation, Message, Role, User};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email is already registered
    #[error("email already registered: {0}")]
    Conflict(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the email is taken; the check
    /// and the insert are a single atomic step.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        username: Option<&str>,
    ) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Create a conversation owned by `user_id`, titled with
    /// [`DEFAULT_CONVERSATION_TITLE`](crate::models::DEFAULT_CONVERSATION_TITLE)
    /// unless a title is given.
    async fn create_conversation(
        &self,
        user_id: i64,
        title: Option<&str>,
    ) -> StoreResult<Conversation>;

    async fn get_conversation(&self, id: i64) -> StoreResult<Option<Conversation>>;

    /// Conversations of a user in creation order
    async fn get_conversations_by_user(&self, user_id: i64) -> StoreResult<Vec<Conversation>>;

    /// Append a message and refresh the conversation's `updated_at`.
    /// Fails with `NotFound` (writing nothing) for an unknown conversation.
    async fn append_message(
        &self,
        conversation_id: i64,
        role: Role,
        content: &str,
    ) -> StoreResult<Message>;

    /// Messages in insertion order. Unknown conversations yield an empty list.
    async fn get_messages(&self, conversation_id: i64) -> StoreResult<Vec<Message>>;
}
