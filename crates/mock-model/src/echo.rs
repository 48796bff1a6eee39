//! Echo model implementation - streams the prompt back.

use async_trait::async_trait;
use futures::stream;
use model_core::{ChatModel, ModelError, ModelRequest, ReplyStream};

/// A model that streams the prompt text back, one word per chunk.
///
/// Useful for testing the reply flow without any hosted model.
#[derive(Debug, Clone, Default)]
pub struct EchoModel {
    /// Optional prefix sent as the first chunk.
    prefix: Option<String>,
}

impl EchoModel {
    /// Create a new EchoModel with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoModel with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_model::EchoModel;
    ///
    /// let model = EchoModel::with_prefix("Echo: ");
    /// // Will reply with "Echo: <prompt text>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

/// Split text into word chunks that concatenate back to the original.
pub(crate) fn word_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() && !current.trim().is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn stream_reply(&self, request: ModelRequest) -> Result<ReplyStream, ModelError> {
        let mut chunks: Vec<String> = self.prefix.iter().cloned().collect();
        chunks.extend(word_chunks(&request.prompt_text()));

        Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
    }

    fn name(&self) -> &str {
        "EchoModel"
    }
}
