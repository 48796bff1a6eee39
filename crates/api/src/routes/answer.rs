//! Streamed model answers.
//!
//! The reply is relayed to the browser as server-sent events:
//!
//! - `chunk` `{"text": ...}` for each piece of the answer, in order
//! - `done` `{"id": ..., "length": ...}` once the exchange is stored
//! - `error` `{"message": ...}` if the model fails; nothing is stored
//!
//! The model stream is driven by a spawned task, so an answer still lands in
//! the chat when the browser goes away before it finishes.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use database::validation::validate_message_text;
use database::{chat, Database, HistoryEntry, Role};
use futures::{Stream, StreamExt};
use model_core::{ChatModel, ModelError, ModelRequest, Turn};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Events buffered between the model task and the response body.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Default, Deserialize)]
pub struct AnswerRequest {
    /// New question. When absent, the chat's unanswered last turn is used.
    #[serde(default)]
    pub question: Option<String>,
    /// Path of an image uploaded with the question.
    #[serde(default)]
    pub img: Option<String>,
    /// Image content to show the model.
    #[serde(default)]
    pub image: Option<InlineImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// What to send the model and what to store afterwards.
#[derive(Debug, PartialEq)]
struct TurnPlan {
    context: Vec<Turn>,
    prompt: String,
    /// User turn to store before the answer; `None` when it is already stored.
    question: Option<HistoryEntry>,
}

fn to_turns(history: &[HistoryEntry]) -> Vec<Turn> {
    history
        .iter()
        .map(|entry| match entry.role {
            Role::User => Turn::user(entry.text()),
            Role::Model => Turn::model(entry.text()),
        })
        .collect()
}

fn plan_turn(
    history: &[HistoryEntry],
    question: Option<String>,
    img: Option<String>,
) -> Result<TurnPlan> {
    if let Some(question) = question.filter(|q| !q.trim().is_empty()) {
        validate_message_text(&question)?;
        return Ok(TurnPlan {
            context: to_turns(history),
            prompt: question.clone(),
            question: Some(HistoryEntry::user(question).with_img(img)),
        });
    }

    match history.split_last() {
        Some((last, earlier)) if last.role == Role::User => Ok(TurnPlan {
            context: to_turns(earlier),
            prompt: last.text(),
            question: None,
        }),
        _ => Err(ApiError::BadRequest(
            "question is required: the chat has no unanswered message".to_string(),
        )),
    }
}

/// Stream the model's answer to the next turn of a chat.
pub async fn stream_answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(chat_id): Path<String>,
    payload: std::result::Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let Json(body) = payload?;

    let model = state
        .model
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("no model is configured".to_string()))?;

    let stored = chat::get_chat(state.db.pool(), &chat_id, &user.user_id).await?;
    let plan = plan_turn(&stored.history, body.question, body.img)?;

    let mut request = ModelRequest::new(plan.context);
    if let Some(image) = body.image {
        if !image.mime_type.starts_with("image/") || image.data.is_empty() {
            return Err(ApiError::BadRequest(
                "image must have an image/* mimeType and data".to_string(),
            ));
        }
        request = request.with_inline_data(image.mime_type, image.data);
    }
    let request = request.with_text(plan.prompt);

    tracing::info!(
        chat_id = %chat_id,
        model = model.name(),
        context_turns = request.history.len(),
        "Generating answer"
    );

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let relay = Relay {
        db: state.db.clone(),
        chat_id,
        user_id: user.user_id,
        question: plan.question,
        tx,
    };
    tokio::spawn(relay.run(model, request));

    let events = ReceiverStream::new(rx).map(Ok::<Event, Infallible>);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn event(name: &str, payload: serde_json::Value) -> Event {
    Event::default().event(name).data(payload.to_string())
}

/// Message shown to the browser for a failed answer; details stay in the logs.
fn client_message(err: &ModelError) -> &'static str {
    match err {
        ModelError::Blocked(_) => "the answer was blocked by the content filter",
        _ => "the model could not answer right now",
    }
}

fn model_error_event(err: &ModelError) -> Event {
    event("error", json!({ "message": client_message(err) }))
}

struct Relay {
    db: Database,
    chat_id: String,
    user_id: String,
    question: Option<HistoryEntry>,
    tx: mpsc::Sender<Event>,
}

impl Relay {
    async fn run(self, model: Arc<dyn ChatModel>, request: ModelRequest) {
        let mut reply = match model.stream_reply(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(chat_id = %self.chat_id, error = %e, "Model request failed");
                let _ = self.tx.send(model_error_event(&e)).await;
                return;
            }
        };

        let mut answer = String::new();
        let mut client_open = true;

        while let Some(item) = reply.next().await {
            match item {
                Ok(text) if text.is_empty() => {}
                Ok(text) => {
                    answer.push_str(&text);
                    if client_open
                        && self.tx.send(event("chunk", json!({ "text": text }))).await.is_err()
                    {
                        client_open = false;
                        tracing::debug!(chat_id = %self.chat_id, "Client went away; finishing answer");
                    }
                }
                Err(e) => {
                    tracing::warn!(chat_id = %self.chat_id, error = %e, "Model stream failed");
                    let _ = self.tx.send(model_error_event(&e)).await;
                    return;
                }
            }
        }

        if answer.trim().is_empty() {
            tracing::warn!(chat_id = %self.chat_id, "Model returned an empty answer");
            let _ = self
                .tx
                .send(event("error", json!({ "message": "the model returned an empty answer" })))
                .await;
            return;
        }

        let length = answer.chars().count();
        let mut entries: Vec<HistoryEntry> = self.question.into_iter().collect();
        entries.push(HistoryEntry::model(answer));

        match chat::append_history(self.db.pool(), &self.chat_id, &self.user_id, &entries).await {
            Ok(()) => {
                tracing::info!(chat_id = %self.chat_id, length, "Stored answer");
                let _ = self
                    .tx
                    .send(event("done", json!({ "id": self.chat_id, "length": length })))
                    .await;
            }
            Err(e) => {
                tracing::error!(chat_id = %self.chat_id, error = %e, "Failed to store answer");
                let _ = self
                    .tx
                    .send(event("error", json!({ "message": "failed to save the answer" })))
                    .await;
            }
        }
    }
}
