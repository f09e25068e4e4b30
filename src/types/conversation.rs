//! Conversation types.

use serde::{Deserialize, Serialize};

use super::timestamp::RawTimestamp;

/// A conversation as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RawTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<RawTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<RawTimestamp>,
}

impl Conversation {
    /// The instant used for recency ordering: last message, falling back
    /// through updated time to creation time.
    pub fn last_activity(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_message_at
            .as_ref()
            .or(self.updated_at.as_ref())
            .or(self.created_at.as_ref())
            .and_then(RawTimestamp::resolve)
    }
}

/// Body of a conversation-create request.
#[derive(Debug, Clone, Serialize)]
pub struct NewConversation {
    pub title: String,
    pub system_prompt: String,
    pub model_id: String,
}

/// Body of a conversation-settings update.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSettings {
    pub model_id: String,
    pub system_prompt: String,
}
