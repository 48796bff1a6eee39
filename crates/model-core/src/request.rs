//! Request types sent to a chat model.

use serde::{Deserialize, Serialize};

/// Speaker of a prior turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// A prior turn given to the model as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// One part of the new prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptPart {
    /// Plain text.
    Text(String),
    /// Base64-encoded inline media, e.g. an attached image.
    InlineData { mime_type: String, data: String },
}

/// A request for the next model turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Prior turns, oldest first.
    pub history: Vec<Turn>,
    /// The new user prompt.
    pub prompt: Vec<PromptPart>,
}

impl ModelRequest {
    /// Create a request with the given context and no prompt yet.
    pub fn new(history: Vec<Turn>) -> Self {
        Self {
            history,
            prompt: Vec::new(),
        }
    }

    /// Append a text part to the prompt.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.prompt.push(PromptPart::Text(text.into()));
        self
    }

    /// Append an inline media part to the prompt.
    pub fn with_inline_data(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.prompt.push(PromptPart::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        });
        self
    }

    /// Text parts of the prompt joined together.
    pub fn prompt_text(&self) -> String {
        self.prompt
            .iter()
            .filter_map(|part| match part {
                PromptPart::Text(text) => Some(text.as_str()),
                PromptPart::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_skips_media() {
        let request = ModelRequest::new(vec![Turn::user("hi"), Turn::model("hello")])
            .with_inline_data("image/png", "aGVsbG8=")
            .with_text("what is this?");

        assert_eq!(request.history.len(), 2);
        assert_eq!(request.prompt.len(), 2);
        assert_eq!(request.prompt_text(), "what is this?");
    }
}
