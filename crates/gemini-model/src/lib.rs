//! Gemini-backed chat model.
//!
//! This crate provides a [`ChatModel`] implementation that calls Google's
//! Gemini `streamGenerateContent` endpoint and hands the reply back as a
//! stream of text chunks.
//!
//! # Features
//!
//! - Incremental consumption of the server-sent event stream
//! - Prior turns and inline images forwarded with each request
//! - Harassment and hate-speech safety filters at a configurable threshold
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemini_model::{collect_reply, ChatModel, GeminiModel, ModelRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = GeminiModel::from_env()?;
//!     let request = ModelRequest::default().with_text("Write a haiku about rust.");
//!     let reply = collect_reply(model.stream_reply(request).await?).await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod api_types;
mod config;
mod model;

pub use config::{GeminiConfig, GeminiConfigBuilder};
pub use model::GeminiModel;

// Re-export model-core types for convenience
pub use model_core::{
    async_trait, collect_reply, ChatModel, ModelError, ModelRequest, PromptPart, ReplyStream,
    Turn, TurnRole,
};
