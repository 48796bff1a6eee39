//! Input validation for chat documents.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Value contains characters that are not allowed.
    InvalidCharacters(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidCharacters(field) => {
                write!(f, "{} contains invalid characters", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Number of characters of the first message kept as a chat title.
pub const TITLE_LENGTH: usize = 40;

/// Maximum allowed length for a single message.
pub const MAX_MESSAGE_LENGTH: usize = 32_000;

/// Maximum allowed length for a user ID.
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Build a chat title from the message that started the chat.
///
/// Leading and trailing whitespace is dropped, then the first
/// [`TITLE_LENGTH`] characters are kept.
pub fn make_title(text: &str) -> String {
    text.trim().chars().take(TITLE_LENGTH).collect()
}

/// Validate message text. Blank text is rejected.
pub fn validate_message_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty("text".to_string()));
    }

    let len = text.chars().count();
    if len > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "text".to_string(),
            max: MAX_MESSAGE_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate a user ID issued by the identity provider.
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::Empty("userId".to_string()));
    }

    let len = user_id.chars().count();
    if len > MAX_USER_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "userId".to_string(),
            max: MAX_USER_ID_LENGTH,
            actual: len,
        });
    }

    if user_id.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::InvalidCharacters("userId".to_string()));
    }

    Ok(())
}
