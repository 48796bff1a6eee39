//! Core trait and types for generative chat models.
//!
//! This crate provides the shared interface for model backends:
//!
//! - [`ChatModel`] - The trait every backend implements
//! - [`ModelRequest`] / [`Turn`] / [`PromptPart`] - What is sent to a model
//! - [`ReplyStream`] - The incrementally delivered reply
//! - [`ModelError`] - Error types for model operations
//!
//! # Example
//!
//! ```rust
//! use futures::stream;
//! use model_core::{async_trait, ChatModel, ModelError, ModelRequest, ReplyStream};
//!
//! struct Shouter;
//!
//! #[async_trait]
//! impl ChatModel for Shouter {
//!     async fn stream_reply(&self, request: ModelRequest) -> Result<ReplyStream, ModelError> {
//!         let reply = request.prompt_text().to_uppercase();
//!         Ok(Box::pin(stream::iter(vec![Ok(reply)])))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Shouter"
//!     }
//! }
//! ```

mod error;
mod request;
mod trait_def;

pub use error::ModelError;
pub use request::{ModelRequest, PromptPart, Turn, TurnRole};
pub use trait_def::{collect_reply, ChatModel, ReplyStream};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
