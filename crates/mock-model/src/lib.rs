//! Mock chat models.
//!
//! This crate provides mock implementations of the `ChatModel` trait:
//! - `EchoModel` - Streams the prompt back word by word
//! - `FailingModel` - Fails the stream after a number of chunks
//! - `DelayedModel` - Wraps another model with a per-chunk delay
//!
//! For a hosted model, use the `gemini-model` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_model::{collect_reply, ChatModel, EchoModel, ModelRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_model::ModelError> {
//!     let model = EchoModel::new();
//!
//!     let request = ModelRequest::default().with_text("Hello!");
//!     let reply = collect_reply(model.stream_reply(request).await?).await?;
//!     println!("Reply: {}", reply);
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;

// Re-export model-core types for convenience
pub use model_core::{
    async_trait, collect_reply, ChatModel, ModelError, ModelRequest, PromptPart, ReplyStream,
    Turn, TurnRole,
};

pub use delayed::DelayedModel;
pub use echo::EchoModel;
pub use failing::FailingModel;
