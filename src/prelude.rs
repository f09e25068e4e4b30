//! Convenience re-exports for common use.

pub use crate::config::ClientConfig;
pub use crate::error::{ParlorError, Result};
pub use crate::session::ChatSession;
pub use crate::transport::{TransportEvent, TransportState};
pub use crate::types::{
    ChatMessage, Conversation, InboundFrame, ModelInfo, OutboundFrame, RawTimestamp, Role,
};
pub use crate::view::{Notifier, Renderer, Severity};
