//! GeminiModel implementation using the Gemini streaming API.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use model_core::{ChatModel, ModelError, ModelRequest, PromptPart, ReplyStream, TurnRole};
use reqwest::Client;
use reqwest_eventsource::{retry, Event, EventSource, RequestBuilderExt};
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SafetySetting,
};
use crate::config::{GeminiConfig, FILTERED_CATEGORIES};

/// A chat model backed by Google's Gemini API.
///
/// Replies are consumed from the server-sent event stream as they arrive;
/// each event's candidate text becomes one chunk of the [`ReplyStream`].
pub struct GeminiModel {
    client: Client,
    config: GeminiConfig,
}

impl GeminiModel {
    /// Create a new GeminiModel with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder().build().map_err(|e| {
            ModelError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(
            model = %config.model,
            threshold = %config.block_threshold,
            "GeminiModel initialized"
        );

        Ok(Self { client, config })
    }

    /// Create a GeminiModel from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Build the API request body for a model request.
    pub(crate) fn build_request(&self, request: &ModelRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => Content::user(turn.text.clone()),
                TurnRole::Model => Content::model(turn.text.clone()),
            })
            .collect();

        let parts = request
            .prompt
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::text(text.clone()),
                PromptPart::InlineData { mime_type, data } => {
                    Part::inline(mime_type.clone(), data.clone())
                }
            })
            .collect();

        contents.push(Content {
            role: Some("user".to_string()),
            parts,
        });

        let safety_settings = FILTERED_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: category.to_string(),
                threshold: self.config.block_threshold.clone(),
            })
            .collect();

        let generation_config =
            if self.config.max_output_tokens.is_some() || self.config.temperature.is_some() {
                Some(GenerationConfig {
                    max_output_tokens: self.config.max_output_tokens,
                    temperature: self.config.temperature,
                })
            } else {
                None
            };

        let system_instruction = self.config.system_prompt.as_ref().map(|prompt| Content {
            role: None,
            parts: vec![Part::text(prompt.clone())],
        });

        GenerateContentRequest {
            contents,
            safety_settings,
            generation_config,
            system_instruction,
        }
    }
}

/// Decode one SSE `data` payload into a reply chunk.
///
/// Returns `Ok(None)` for events that carry no text (e.g. the final
/// finish-reason event).
pub(crate) fn parse_event_data(data: &str) -> Result<Option<String>, ModelError> {
    let response: GenerateContentResponse =
        serde_json::from_str(data).map_err(|e| ModelError::Parse(e.to_string()))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(ModelError::Blocked(reason.to_string()));
    }

    let text = response.text();
    if text.is_empty() {
        if response.finish_reason() == Some("SAFETY") {
            return Err(ModelError::Blocked("SAFETY".to_string()));
        }
        return Ok(None);
    }

    Ok(Some(text))
}

/// Turn an error status body into a [`ModelError::Api`].
fn api_error(status: u16, body: &str) -> ModelError {
    let message = match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => api_error.error.message,
        Err(_) => body.to_string(),
    };
    ModelError::Api { status, message }
}

/// Pull the next text chunk out of the event source.
async fn next_chunk(source: &mut EventSource) -> Option<Result<String, ModelError>> {
    loop {
        match source.next().await? {
            Ok(Event::Open) => {
                debug!("Gemini stream opened");
                continue;
            }
            Ok(Event::Message(message)) => match parse_event_data(&message.data) {
                Ok(Some(text)) => return Some(Ok(text)),
                Ok(None) => continue,
                Err(e) => {
                    source.close();
                    return Some(Err(e));
                }
            },
            Err(reqwest_eventsource::Error::StreamEnded) => {
                debug!("Gemini stream ended");
                source.close();
                return None;
            }
            Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                source.close();
                let body = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), "Gemini API returned an error status");
                return Some(Err(api_error(status.as_u16(), &body)));
            }
            Err(e) => {
                source.close();
                return Some(Err(ModelError::Network(e.to_string())));
            }
        }
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    async fn stream_reply(&self, request: ModelRequest) -> Result<ReplyStream, ModelError> {
        let body = self.build_request(&request);

        debug!(
            model = %self.config.model,
            turns = body.contents.len(),
            "Sending streaming request to Gemini"
        );

        let mut source = self
            .client
            .post(self.config.stream_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .eventsource()
            .map_err(|e| ModelError::Configuration(format!("Failed to build request: {}", e)))?;
        source.set_retry_policy(Box::new(retry::Never));

        let stream = stream::unfold(source, |mut source| async move {
            let item = next_chunk(&mut source).await?;
            Some((item, source))
        });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "GeminiModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::{Json, Router};
    use model_core::{collect_reply, Turn};

    fn test_model() -> GeminiModel {
        GeminiModel::new(GeminiConfig::builder().api_key("test-key").build()).unwrap()
    }

    /// Serve `router` on an ephemeral local port and return a model pointed at it.
    async fn local_model(router: Router) -> GeminiModel {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = GeminiConfig::builder()
            .api_key("test-key")
            .api_url(format!("http://{}", addr))
            .build();
        GeminiModel::new(config).unwrap()
    }

    async fn streamed_reply() -> impl IntoResponse {
        (
            [(header::CONTENT_TYPE, "text/event-stream")],
            concat!(
                "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n",
                "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\" world\"}]},\"finishReason\":\"STOP\"}]}\n\n",
            ),
        )
    }

    async fn rejected_key() -> impl IntoResponse {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })),
        )
    }

    #[tokio::test]
    async fn test_stream_reply_joins_events() {
        let model = local_model(Router::new().fallback(streamed_reply)).await;
        let request = ModelRequest::default().with_text("hi");

        let reply = collect_reply(model.stream_reply(request).await.unwrap()).await.unwrap();
        assert_eq!(reply, "Hello world");
    }

    #[tokio::test]
    async fn test_stream_reply_error_status() {
        let model = local_model(Router::new().fallback(rejected_key)).await;
        let request = ModelRequest::default().with_text("hi");

        let result = collect_reply(model.stream_reply(request).await.unwrap()).await;
        match result {
            Err(ModelError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let result = GeminiModel::new(GeminiConfig::default());
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_build_request_shape() {
        let model = test_model();
        let request = ModelRequest::new(vec![Turn::user("hi"), Turn::model("hello")])
            .with_inline_data("image/jpeg", "Zm9v")
            .with_text("what is in this picture?");

        let body = serde_json::to_value(model.build_request(&request)).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "hello");
        assert_eq!(body["contents"][2]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["contents"][2]["parts"][1]["text"], "what is in this picture?");
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 2);
        assert_eq!(body["safetySettings"][0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(body["safetySettings"][1]["threshold"], "BLOCK_LOW_AND_ABOVE");
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_build_request_with_generation_config() {
        let model = GeminiModel::new(
            GeminiConfig::builder()
                .api_key("k")
                .max_output_tokens(100)
                .system_prompt("Answer in Markdown")
                .build(),
        )
        .unwrap();

        let body = serde_json::to_value(model.build_request(&ModelRequest::default().with_text("x")))
            .unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 100);
        assert!(body["generationConfig"].get("temperature").is_none());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Answer in Markdown");
    }

    #[test]
    fn test_parse_event_text() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" world"}]}}]}"#;
        assert_eq!(parse_event_data(data).unwrap(), Some("Hello world".to_string()));
    }

    #[test]
    fn test_parse_event_without_text() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(parse_event_data(data).unwrap(), None);
    }

    #[test]
    fn test_parse_event_blocked() {
        let data = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(parse_event_data(data), Err(ModelError::Blocked(_))));

        let data = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(matches!(parse_event_data(data), Err(ModelError::Blocked(_))));
    }

    #[test]
    fn test_parse_event_garbage() {
        assert!(matches!(parse_event_data("not json"), Err(ModelError::Parse(_))));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match api_error(400, body) {
            ModelError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }

        match api_error(502, "bad gateway") {
            ModelError::Api { message, .. } => assert_eq!(message, "bad gateway"),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}
