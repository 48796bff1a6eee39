//! Database models.
//!
//! Documents serialize in camelCase with `_id` identifiers, the shape the
//! browser client reads.

use serde::{Deserialize, Serialize};

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The signed-in user.
    User,
    /// The generative model.
    Model,
}

/// A text fragment of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Path of an image uploaded alongside the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl HistoryEntry {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
            img: None,
        }
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
            img: None,
        }
    }

    /// Attach an uploaded image path.
    pub fn with_img(mut self, img: Option<String>) -> Self {
        self.img = img;
        self
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// A conversation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Chat ID (UUID v4).
    #[serde(rename = "_id")]
    pub id: String,
    /// Owner of the conversation.
    pub user_id: String,
    /// Ordered turns, oldest first.
    pub history: Vec<HistoryEntry>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A summary line in a user's chat index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    /// ID of the referenced chat.
    #[serde(rename = "_id")]
    pub chat_id: String,
    /// Truncated first message.
    pub title: String,
    /// When the entry was added.
    #[serde(default)]
    pub created_at: String,
}

/// Per-user index of conversations, used for the sidebar listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChats {
    pub user_id: String,
    /// Entries in the order the chats were started.
    pub chats: Vec<ChatEntry>,
    pub created_at: String,
    pub updated_at: String,
}
