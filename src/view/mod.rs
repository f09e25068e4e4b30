//! Rendering and notification seams.
//!
//! The core state machines never touch a UI directly; they drive these
//! traits. A real frontend implements them against its widget tree, tests
//! implement them as recorders.

use crate::types::{ChatMessage, Conversation};

/// Notice severity. Notices are transient and auto-dismissing; nothing in
/// this crate is fatal to the page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

/// Sink for transient user-visible notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }
}

/// Notifier that routes notices to `tracing`.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => tracing::error!(notice = message, "user notice"),
            Severity::Success => tracing::info!(notice = message, "user notice"),
        }
    }
}

/// External content renderer, `render(text) -> safe markup`.
///
/// Treated as pure and idempotent; the streaming reducer re-renders the
/// full accumulated buffer through it on every flush.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// Renderer that escapes markup-significant characters and nothing else.
#[derive(Debug, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }
}

/// The message list of the active conversation.
///
/// Implementations own scroll behavior: `insert_older` must keep the
/// previously visible content at the same visual position (the inserted
/// block pushes content down by exactly its own height), `push_live` and
/// streaming renders keep the view pinned to the bottom.
pub trait ChatView: Send {
    /// Remove every rendered message.
    fn clear(&mut self);

    /// Show the "start a conversation" placeholder for an empty history.
    fn show_empty_placeholder(&mut self);

    /// Insert a block of older messages above the existing content,
    /// already sorted ascending by creation time.
    fn insert_older(&mut self, messages: &[ChatMessage]);

    /// Append a message at the bottom and scroll to it.
    fn push_live(&mut self, message: &ChatMessage);

    /// Jump to the bottom of the history.
    fn scroll_to_bottom(&mut self);

    /// Append an empty assistant message marked as in-progress.
    fn begin_streaming(&mut self);

    /// Replace the in-progress message's content with rendered markup.
    fn render_streaming(&mut self, markup: &str);

    /// Unmark the in-progress message, attaching the server-assigned id
    /// and display timestamp when the completion frame carried them.
    fn finish_streaming(&mut self, id: Option<&str>, timestamp_display: Option<&str>);
}

/// The conversation sidebar and the controls tied to the active one.
pub trait DirectoryView: Send {
    /// Replace the rendered list; `active_id` keeps the highlight on the
    /// conversation that is currently selected, if still present.
    fn render_list(&mut self, conversations: &[Conversation], active_id: Option<&str>);

    /// Show a conversation's detail and enable its dependent controls,
    /// as a single atomic update.
    fn show_active(&mut self, conversation: &Conversation);

    /// Clear the detail pane, disable dependent controls, and show the
    /// welcome placeholder.
    fn show_welcome(&mut self);

    /// Show only conversations matching a filter query; empty query shows
    /// all. Purely a display concern, the list itself is untouched.
    fn apply_filter(&mut self, visible_ids: &[String]);
}

/// Confirmation prompt seam for destructive operations.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmation that always accepts. Frontends replace this with a real
/// dialog.
#[derive(Debug, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
