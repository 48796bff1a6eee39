//! Error types for model operations.

use thiserror::Error;

/// Errors that can occur while generating a reply.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model is misconfigured (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the model or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The model API answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The prompt or the reply was blocked by safety filters.
    #[error("reply blocked: {0}")]
    Blocked(String),

    /// A streamed event could not be decoded.
    #[error("failed to parse model output: {0}")]
    Parse(String),

    /// The model is temporarily unavailable.
    #[error("model unavailable: {0}")]
    Unavailable(String),
}
