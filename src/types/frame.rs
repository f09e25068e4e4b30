//! Wire frames for the streaming channel.

use serde::{Deserialize, Serialize};

use super::message::{ChatMessage, Role};
use crate::error::Result;

/// An outbound frame pushed over the streaming channel.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    pub conversation_id: String,
    pub content: String,
    pub role: Role,
}

/// An inbound frame, demultiplexed by kind.
///
/// An explicit `error` field short-circuits normal dispatch regardless of
/// any `type` tag also present. Unknown kinds are preserved so forward
/// compatibility can be logged rather than failing parse.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Incremental fragment of assistant-generated text.
    Delta { content: String },
    /// Turn complete; the server may attach the canonical stored message.
    Done { message: Option<ChatMessage> },
    /// Server-reported error, surfaced instead of being treated as content.
    ServerError { message: String },
    /// Unrecognized frame kind.
    Unknown { kind: Option<String> },
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message: Option<ChatMessage>,
}

impl InboundFrame {
    /// Parse a raw text frame.
    pub fn parse(raw: &str) -> Result<Self> {
        let frame: RawFrame = serde_json::from_str(raw)?;
        if let Some(error) = frame.error {
            return Ok(Self::ServerError { message: error });
        }
        Ok(match frame.kind.as_deref() {
            Some("stream") => Self::Delta {
                content: frame.content.unwrap_or_default(),
            },
            Some("done") => Self::Done {
                message: frame.message,
            },
            other => Self::Unknown {
                kind: other.map(str::to_string),
            },
        })
    }
}
