//! Failing model implementation - errors partway through a reply.

use async_trait::async_trait;
use futures::stream;
use model_core::{ChatModel, ModelError, ModelRequest, ReplyStream};

use crate::echo::word_chunks;

/// A model that echoes the first `chunks_before_error` words of the prompt
/// and then fails the stream.
///
/// With `chunks_before_error == 0` the stream fails immediately.
#[derive(Debug, Clone)]
pub struct FailingModel {
    chunks_before_error: usize,
    message: String,
}

impl FailingModel {
    /// Create a model that fails after the given number of chunks.
    pub fn after_chunks(chunks_before_error: usize) -> Self {
        Self {
            chunks_before_error,
            message: "simulated model failure".to_string(),
        }
    }

    /// Override the error message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl ChatModel for FailingModel {
    async fn stream_reply(&self, request: ModelRequest) -> Result<ReplyStream, ModelError> {
        let mut items: Vec<Result<String, ModelError>> = word_chunks(&request.prompt_text())
            .into_iter()
            .take(self.chunks_before_error)
            .map(Ok)
            .collect();
        items.push(Err(ModelError::Unavailable(self.message.clone())));

        Ok(Box::pin(stream::iter(items)))
    }

    fn name(&self) -> &str {
        "FailingModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_fails_after_chunks() {
        let model = FailingModel::after_chunks(2).with_message("boom");
        let request = ModelRequest::default().with_text("a b c d");

        let items: Vec<_> = model.stream_reply(request).await.unwrap().collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert_eq!(items[1].as_ref().unwrap(), " b");
        match &items[2] {
            Err(ModelError::Unavailable(msg)) => assert_eq!(msg, "boom"),
            other => panic!("Expected Unavailable error, got {:?}", other),
        }
    }
}
