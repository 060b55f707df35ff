//! AI completion integration
//!
//! This module provides:
//! - The provider contract used by the chat pipeline
//! - A genai-backed provider for OpenAI-compatible models
//! - The conversation orchestrator (see [`orchestrator`])

pub mod orchestrator;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

// GenAI imports
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::Client as GenAIClient;

/// Reply used when the provider answers with no text
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't generate a response.";

/// AI Assistant configuration
#[derive(Clone, Debug)]
pub struct AiConfig {
    /// Model name, resolved to a provider by genai
    pub model: String,
    /// Persona instruction sent ahead of every conversation
    pub system_prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Upper bound on a single provider call
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: "You are Gepetinho, a helpful AI assistant.".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRole {
    System,
    User,
    Assistant,
}

/// One turn of the context sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMessage {
    pub role: ContextRole,
    pub content: String,
}

impl ContextMessage {
    pub fn new(role: ContextRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// External service producing the next assistant turn
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, context: &[ContextMessage]) -> Result<String>;
}

/// Provider backed by the genai client.
///
/// Credentials come from the environment variables genai reads for the
/// model's provider (e.g. `OPENAI_API_KEY`).
pub struct GenAiProvider {
    client: GenAIClient,
    model: String,
    options: ChatOptions,
}

impl GenAiProvider {
    pub fn new(config: &AiConfig) -> Self {
        info!("[AI] Using model: {}", config.model);

        Self {
            client: GenAIClient::default(),
            model: config.model.clone(),
            options: ChatOptions::default()
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens),
        }
    }
}

#[async_trait]
impl CompletionProvider for GenAiProvider {
    async fn complete(&self, context: &[ContextMessage]) -> Result<String> {
        let messages: Vec<ChatMessage> = context
            .iter()
            .map(|msg| match msg.role {
                ContextRole::System => ChatMessage::system(msg.content.as_str()),
                ContextRole::User => ChatMessage::user(msg.content.as_str()),
                ContextRole::Assistant => ChatMessage::assistant(msg.content.as_str()),
            })
            .collect();

        debug!(
            "[AI] Calling {} with {} context messages",
            self.model,
            messages.len()
        );

        let response = self
            .client
            .exec_chat(&self.model, ChatRequest::new(messages), Some(&self.options))
            .await
            .map_err(|e| anyhow::anyhow!("GenAI error: {}", e))?;

        Ok(response.first_text().unwrap_or_default().to_string())
    }
}
