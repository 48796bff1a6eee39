//! Error types for upload-signer.

use thiserror::Error;

/// Errors that can occur when configuring the upload signer.
#[derive(Debug, Error)]
pub enum UploadSignerError {
    /// A required environment variable is missing or empty.
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    /// An environment variable has an unusable value.
    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for upload-signer operations.
pub type Result<T> = std::result::Result<T, UploadSignerError>;
