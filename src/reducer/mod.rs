//! Stream-to-message reducer.
//!
//! Consumes transport events and materializes one growing assistant
//! message in the rendered list. At most one streaming session is open at
//! a time; the first content delta opens it lazily, a `done` frame or a
//! connection drop always closes it.
//!
//! Renders are coalesced: deltas accumulate in the buffer immediately, but
//! the (idempotent) renderer runs at most once per [`StreamReducer::flush`]
//! tick. The driver flushes once per batch of delivered events, the analog
//! of an animation-frame boundary.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::timefmt::format_timestamp_default;
use crate::types::{ChatMessage, InboundFrame};
use crate::view::{ChatView, Notifier, Renderer};

/// What the driver must do after a frame is applied.
#[derive(Debug, PartialEq)]
pub enum TurnEvent {
    /// Nothing beyond what the reducer already did.
    None,
    /// Buffer grew; a flush will re-render the in-progress message.
    RenderPending,
    /// Turn finished. The directory should refresh its ordering, and the
    /// attached message's id (if any) must be registered with the
    /// pagination engine so later pages cannot duplicate it.
    Completed { message: Option<ChatMessage> },
}

/// Streaming session state. Exists only while an assistant turn is in
/// progress.
#[derive(Debug, Default)]
pub struct StreamReducer {
    buffer: String,
    session_open: bool,
    dirty: bool,
}

impl StreamReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_streaming(&self) -> bool {
        self.session_open
    }

    /// Full accumulated text of the in-progress turn.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Dispatch one inbound frame.
    ///
    /// `now` is injected for timestamp display, keeping this testable with
    /// a frozen clock.
    pub fn apply_frame(
        &mut self,
        frame: InboundFrame,
        view: &mut dyn ChatView,
        renderer: &dyn Renderer,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> TurnEvent {
        match frame {
            InboundFrame::Delta { content } => {
                if !self.session_open {
                    // Lazy start: the in-progress message has no server id
                    // yet, so it is not registered with the pagination
                    // engine until completion.
                    self.session_open = true;
                    self.buffer.clear();
                    view.begin_streaming();
                }
                self.buffer.push_str(&content);
                self.dirty = true;
                TurnEvent::RenderPending
            }
            InboundFrame::Done { message } => {
                if self.session_open {
                    // Final render from the complete buffer, then finalize.
                    view.render_streaming(&renderer.render(&self.buffer));
                    let id = message.as_ref().and_then(|m| m.id.as_deref());
                    let timestamp = message
                        .as_ref()
                        .and_then(|m| m.created_at.as_ref())
                        .map(|raw| format_timestamp_default(raw, now));
                    view.finish_streaming(id, timestamp.as_deref());
                    self.buffer.clear();
                    self.session_open = false;
                    self.dirty = false;
                }
                TurnEvent::Completed { message }
            }
            InboundFrame::ServerError { message } => {
                notifier.error(&message);
                TurnEvent::None
            }
            InboundFrame::Unknown { kind } => {
                warn!(kind = kind.as_deref().unwrap_or("<none>"), "unknown frame kind");
                TurnEvent::None
            }
        }
    }

    /// Re-render the in-progress message if any deltas arrived since the
    /// last flush. Accumulation is never skipped, only the render call is
    /// throttled to this boundary.
    pub fn flush(&mut self, view: &mut dyn ChatView, renderer: &dyn Renderer) {
        if self.session_open && self.dirty {
            view.render_streaming(&renderer.render(&self.buffer));
            self.dirty = false;
        }
    }

    /// Terminate the session without a completion frame (connection loss).
    pub fn abort(&mut self, view: &mut dyn ChatView) {
        if self.session_open {
            debug!("terminating streaming session without completion");
            view.finish_streaming(None, None);
            self.buffer.clear();
            self.session_open = false;
            self.dirty = false;
        }
    }
}
