//! Chat turn pipeline
//!
//! Persists the user's message, rebuilds the ordered history, asks the
//! provider for a reply and persists that too. A provider failure leaves
//! the user's message in place; nothing is retried.

use super::{AiConfig, CompletionProvider, ContextMessage, ContextRole, EMPTY_REPLY_FALLBACK};
use crate::error::{Error, Result};
use crate::models::{Message, Role};
use crate::store::ConversationStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub message: String,
    pub conversation_id: i64,
}

pub struct Orchestrator {
    store: Arc<dyn ConversationStore>,
    provider: Arc<dyn CompletionProvider>,
    system_prompt: String,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn CompletionProvider>,
        config: &AiConfig,
    ) -> Self {
        Self {
            store,
            provider,
            system_prompt: config.system_prompt.clone(),
            timeout: config.timeout,
        }
    }

    pub async fn converse(
        &self,
        user_id: i64,
        conversation_id: Option<i64>,
        text: &str,
    ) -> Result<Reply> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Message is required".to_string()));
        }

        if self.store.get_user_by_id(user_id).await?.is_none() {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let conversation_id = match conversation_id {
            Some(id) => {
                match self.store.get_conversation(id).await? {
                    Some(conv) if conv.user_id == user_id => id,
                    // Someone else's conversation is reported as missing.
                    _ => return Err(Error::NotFound("Conversation not found".to_string())),
                }
            }
            None => {
                let conv = self.store.create_conversation(user_id, None).await?;
                info!("[Chat] Created conversation {} for user {}", conv.id, user_id);
                conv.id
            }
        };

        self.store
            .append_message(conversation_id, Role::User, text)
            .await?;

        let history = self.store.get_messages(conversation_id).await?;
        let context = self.build_context(&history);

        let reply = match tokio::time::timeout(self.timeout, self.provider.complete(&context)).await
        {
            Ok(Ok(text)) if text.is_empty() => EMPTY_REPLY_FALLBACK.to_string(),
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(
                    "[Chat] Provider failed for conversation {}: {:#}",
                    conversation_id, e
                );
                return Err(Error::Upstream(format!("{:#}", e)));
            }
            Err(_) => {
                warn!(
                    "[Chat] Provider timed out after {:?} for conversation {}",
                    self.timeout, conversation_id
                );
                return Err(Error::Upstream(format!(
                    "provider timed out after {:?}",
                    self.timeout
                )));
            }
        };

        self.store
            .append_message(conversation_id, Role::Assistant, &reply)
            .await?;

        info!(
            "[Chat] Responded in conversation {} (history of {})",
            conversation_id,
            history.len()
        );

        Ok(Reply {
            message: reply,
            conversation_id,
        })
    }

    /// System persona followed by the stored history, oldest first
    fn build_context(&self, history: &[Message]) -> Vec<ContextMessage> {
        let mut context = Vec::with_capacity(history.len() + 1);
        context.push(ContextMessage::new(ContextRole::System, &self.system_prompt));
        context.extend(history.iter().map(|msg| {
            let role = match msg.role {
                Role::User => ContextRole::User,
                Role::Assistant => ContextRole::Assistant,
            };
            ContextMessage::new(role, msg.content.clone())
        }));
        context
    }
}
