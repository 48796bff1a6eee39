//! Chat documents and the per-user chat index.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use database::validation::{make_title, validate_message_text};
use database::{chat, user_chats, Chat, ChatEntry, HistoryEntry};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    /// Path of an image uploaded with the question.
    #[serde(default)]
    pub img: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatId {
    pub id: String,
}

/// Start a chat with the user's first message and record it in their index.
///
/// The chat is written before the index; if the index write fails the chat
/// remains but is not listed.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatId>)> {
    let Json(body) = payload?;
    let user_id = required(body.user_id, "userId")?;
    let text = required(body.text, "text")?;

    if user_id != user.user_id {
        tracing::warn!(session_user = %user.user_id, "Chat creation for another user refused");
        return Err(ApiError::Forbidden(
            "userId does not match the signed-in user".to_string(),
        ));
    }

    let pool = state.db.pool();
    let chat = chat::create_chat(pool, &user_id, &text).await?;
    let index = user_chats::add_chat_for_user(pool, &user_id, &chat.id, &make_title(&text)).await?;

    tracing::info!(chat_id = %chat.id, user_id = %user_id, index = ?index, "Created chat");

    Ok((StatusCode::CREATED, Json(ChatId { id: chat.id })))
}

/// List the caller's chats, oldest first.
pub async fn list_user_chats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChatEntry>>> {
    let entries = user_chats::list_chat_entries(state.db.pool(), &user.user_id).await?;
    Ok(Json(entries))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> Result<Json<Chat>> {
    let chat = chat::get_chat(state.db.pool(), &chat_id, &user.user_id).await?;
    Ok(Json(chat))
}

/// Append a completed exchange to a chat.
///
/// The question turn is optional: on the first answer the user's message is
/// already stored from chat creation.
pub async fn update_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
    payload: std::result::Result<Json<UpdateChatRequest>, JsonRejection>,
) -> Result<Json<ChatId>> {
    let Json(body) = payload?;
    let answer = required(body.answer, "answer")?;

    let mut entries = Vec::with_capacity(2);
    if let Some(question) = body.question.filter(|q| !q.trim().is_empty()) {
        validate_message_text(&question)?;
        entries.push(HistoryEntry::user(question).with_img(body.img));
    }
    entries.push(HistoryEntry::model(answer));

    chat::append_history(state.db.pool(), &chat_id, &user.user_id, &entries).await?;

    tracing::info!(chat_id = %chat_id, appended = entries.len(), "Updated chat");

    Ok(Json(ChatId { id: chat_id }))
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_blank() {
        assert!(required(None, "text").is_err());
        assert!(required(Some("  \n".to_string()), "text").is_err());
        assert_eq!(required(Some("hi".to_string()), "text").unwrap(), "hi");
    }

    #[test]
    fn test_create_request_accepts_camel_case() {
        let body: CreateChatRequest =
            serde_json::from_str(r#"{"userId": "user_1", "text": "hello"}"#).unwrap();
        assert_eq!(body.user_id.as_deref(), Some("user_1"));
        assert_eq!(body.text.as_deref(), Some("hello"));

        let body: CreateChatRequest = serde_json::from_str("{}").unwrap();
        assert!(body.user_id.is_none() && body.text.is_none());
    }
}
