//! Chat handlers

use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::models::{Conversation, Message};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Serialize)]
pub struct ConversationHistory {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    ctx: Ctx,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(req) = payload?;
    // Ids start at 1, so 0 means "start a new conversation".
    let conversation_id = req.conversation_id.filter(|id| *id != 0);
    info!(
        "POST /api/chat - user {} ({}) conversation {:?}",
        ctx.user_id(),
        ctx.email(),
        conversation_id
    );

    let reply = state
        .orchestrator
        .converse(ctx.user_id(), conversation_id, &req.message)
        .await?;

    Ok(Json(ChatResponse {
        message: reply.message,
        conversation_id: reply.conversation_id,
    }))
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<ConversationList>> {
    if state.store.get_user_by_id(ctx.user_id()).await?.is_none() {
        return Err(Error::NotFound("User not found".to_string()));
    }

    let conversations = state.store.get_conversations_by_user(ctx.user_id()).await?;
    Ok(Json(ConversationList { conversations }))
}

/// GET /api/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    ctx: Ctx,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ConversationHistory>> {
    let Path(conversation_id) = path?;
    let conversation = state
        .store
        .get_conversation(conversation_id)
        .await?
        .filter(|c| c.user_id == ctx.user_id())
        .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

    let messages = state.store.get_messages(conversation.id).await?;
    Ok(Json(ConversationHistory {
        conversation,
        messages,
    }))
}
