//! services/api/src/web/chatbot.rs
//!
//! Handlers for the chatbot wrapper. The model call happens first; history
//! is only written after a successful reply, so a failed external call
//! leaves no local state behind.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studyhub_core::domain::ChatEntry;
use studyhub_core::ports::PortError;

use crate::error::HttpError;
use crate::web::middleware::CurrentAccount;
use crate::web::state::AppState;

/// How much history the chatbot page shows.
const HISTORY_LIMIT: usize = 10;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub prompt: String,
    pub response: String,
}

#[derive(Serialize)]
pub struct ChatHistoryResponse {
    pub history: Vec<ChatEntry>,
}

/// POST /chatbot - Ask the study assistant a question.
pub async fn chatbot_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, HttpError> {
    if req.message.trim().is_empty() {
        return Err(PortError::validation("message", "message must not be empty").into());
    }

    let reply = state.chat.reply(&req.message).await?;
    state
        .store
        .append_chat_entry(owner, &req.message, &reply)
        .await?;

    Ok(Json(ChatResponse {
        prompt: req.message,
        response: reply,
    }))
}

/// GET /chatbot - Recent exchanges, newest first.
pub async fn chat_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<Json<ChatHistoryResponse>, HttpError> {
    let history = state.store.list_chat_entries(owner, HISTORY_LIMIT).await?;
    Ok(Json(ChatHistoryResponse { history }))
}

/// GET /chatbot/clear - Drop the caller's chat history.
pub async fn clear_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(owner)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, HttpError> {
    state.store.clear_chat_entries(owner).await?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}
