//! Chat endpoints
//!
//! Conversation turns go through the [`Orchestrator`](crate::ai::orchestrator::Orchestrator);
//! read-only listings hit the store directly.

pub mod handlers;

pub use handlers::{chat, list_conversations, list_messages};
