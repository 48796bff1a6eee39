//! Delayed model implementation - wraps another model with per-chunk delay.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use model_core::{ChatModel, ModelError, ModelRequest, ReplyStream};
use tokio::time::sleep;

/// A model that wraps another model and waits before every chunk.
///
/// Useful for simulating the pacing of a hosted model's streamed reply.
pub struct DelayedModel<M: ChatModel> {
    inner: M,
    delay: Duration,
}

impl<M: ChatModel> DelayedModel<M> {
    /// Create a new DelayedModel wrapping the given model with the specified delay.
    pub fn new(inner: M, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a model with a per-chunk delay in milliseconds.
    pub fn with_millis(inner: M, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for DelayedModel<M> {
    async fn stream_reply(&self, request: ModelRequest) -> Result<ReplyStream, ModelError> {
        let delay = self.delay;
        let inner = self.inner.stream_reply(request).await?;

        Ok(Box::pin(inner.then(move |chunk| async move {
            sleep(delay).await;
            chunk
        })))
    }

    fn name(&self) -> &str {
        "DelayedModel"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EchoModel;
    use model_core::collect_reply;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_model() {
        let model = DelayedModel::with_millis(EchoModel::new(), 20);
        let request = ModelRequest::default().with_text("one two three");

        let start = Instant::now();
        let reply = collect_reply(model.stream_reply(request).await.unwrap())
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(reply, "one two three");
        assert!(elapsed >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_model_name() {
        let model = DelayedModel::with_millis(EchoModel::new(), 0);
        assert_eq!(model.name(), "DelayedModel");
    }
}
