//! The ChatModel trait definition.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};

use crate::error::ModelError;
use crate::request::ModelRequest;

/// A stream of reply text chunks, in the order the model produced them.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// A generative model that streams its reply.
///
/// This trait is object-safe and can be used as `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start generating a reply.
    ///
    /// Errors that happen before the first chunk (bad configuration, rejected
    /// request) are returned directly; errors after that arrive as stream
    /// items.
    async fn stream_reply(&self, request: ModelRequest) -> Result<ReplyStream, ModelError>;

    /// Get a human-readable name for this model implementation.
    fn name(&self) -> &str;

    /// Check if the model is ready to serve requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

/// Drain a reply stream into the full reply text.
///
/// Chunks are concatenated in arrival order; the first error aborts.
pub async fn collect_reply(mut stream: ReplyStream) -> Result<String, ModelError> {
    let mut reply = String::new();
    while let Some(chunk) = stream.next().await {
        reply.push_str(&chunk?);
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_reply_concatenates() {
        let chunks = vec![Ok("Hel".to_string()), Ok("lo".to_string()), Ok("!".to_string())];
        let stream: ReplyStream = Box::pin(stream::iter(chunks));
        assert_eq!(collect_reply(stream).await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_collect_reply_stops_on_error() {
        let chunks = vec![
            Ok("partial".to_string()),
            Err(ModelError::Network("reset".to_string())),
            Ok("never".to_string()),
        ];
        let stream: ReplyStream = Box::pin(stream::iter(chunks));
        let err = collect_reply(stream).await.unwrap_err();
        assert!(matches!(err, ModelError::Network(_)));
    }
}
