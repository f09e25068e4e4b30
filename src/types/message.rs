//! Message types for the chat history and the live stream.

use serde::{Deserialize, Serialize};

use super::timestamp::RawTimestamp;

/// A message in a conversation.
///
/// `id` is absent for an in-flight streaming message until the server
/// assigns one on turn completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RawTimestamp>,
}

impl ChatMessage {
    /// Create a user message timestamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: text.into(),
            created_at: Some(chrono::Utc::now().into()),
        }
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}
