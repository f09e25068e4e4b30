//! Shared test fakes: recording views, notifier, and renderer.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use parlor::types::{ChatMessage, Conversation};
use parlor::view::{ChatView, Confirm, DirectoryView, Notifier, Renderer, Severity};

/// Everything a `ChatView` can be asked to do, recorded in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Clear,
    EmptyPlaceholder,
    InsertOlder(Vec<String>),
    PushLive(String),
    ScrollToBottom,
    BeginStreaming,
    RenderStreaming(String),
    FinishStreaming {
        id: Option<String>,
        timestamp: Option<String>,
    },
}

pub type ViewLog = Arc<Mutex<Vec<ViewEvent>>>;

pub struct RecordingChatView {
    log: ViewLog,
}

impl RecordingChatView {
    pub fn new() -> (Self, ViewLog) {
        let log: ViewLog = Arc::new(Mutex::new(Vec::new()));
        (Self { log: Arc::clone(&log) }, log)
    }

    fn record(&self, event: ViewEvent) {
        self.log.lock().unwrap().push(event);
    }
}

fn message_label(message: &ChatMessage) -> String {
    message
        .id
        .clone()
        .unwrap_or_else(|| message.content.clone())
}

impl ChatView for RecordingChatView {
    fn clear(&mut self) {
        self.record(ViewEvent::Clear);
    }

    fn show_empty_placeholder(&mut self) {
        self.record(ViewEvent::EmptyPlaceholder);
    }

    fn insert_older(&mut self, messages: &[ChatMessage]) {
        self.record(ViewEvent::InsertOlder(
            messages.iter().map(message_label).collect(),
        ));
    }

    fn push_live(&mut self, message: &ChatMessage) {
        self.record(ViewEvent::PushLive(message_label(message)));
    }

    fn scroll_to_bottom(&mut self) {
        self.record(ViewEvent::ScrollToBottom);
    }

    fn begin_streaming(&mut self) {
        self.record(ViewEvent::BeginStreaming);
    }

    fn render_streaming(&mut self, markup: &str) {
        self.record(ViewEvent::RenderStreaming(markup.to_string()));
    }

    fn finish_streaming(&mut self, id: Option<&str>, timestamp_display: Option<&str>) {
        self.record(ViewEvent::FinishStreaming {
            id: id.map(str::to_string),
            timestamp: timestamp_display.map(str::to_string),
        });
    }
}

/// Directory-side recording.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryEvent {
    RenderList {
        ids: Vec<String>,
        active_id: Option<String>,
    },
    ShowActive(String),
    ShowWelcome,
    ApplyFilter(Vec<String>),
}

pub type DirectoryLog = Arc<Mutex<Vec<DirectoryEvent>>>;

pub struct RecordingDirectoryView {
    log: DirectoryLog,
}

impl RecordingDirectoryView {
    pub fn new() -> (Self, DirectoryLog) {
        let log: DirectoryLog = Arc::new(Mutex::new(Vec::new()));
        (Self { log: Arc::clone(&log) }, log)
    }

    fn record(&self, event: DirectoryEvent) {
        self.log.lock().unwrap().push(event);
    }
}

impl DirectoryView for RecordingDirectoryView {
    fn render_list(&mut self, conversations: &[Conversation], active_id: Option<&str>) {
        self.record(DirectoryEvent::RenderList {
            ids: conversations.iter().map(|c| c.id.clone()).collect(),
            active_id: active_id.map(str::to_string),
        });
    }

    fn show_active(&mut self, conversation: &Conversation) {
        self.record(DirectoryEvent::ShowActive(conversation.id.clone()));
    }

    fn show_welcome(&mut self) {
        self.record(DirectoryEvent::ShowWelcome);
    }

    fn apply_filter(&mut self, visible_ids: &[String]) {
        self.record(DirectoryEvent::ApplyFilter(visible_ids.to_vec()));
    }
}

/// Notifier that records notices instead of displaying them.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<(Severity, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(severity, _)| *severity == Severity::Error)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

/// Renderer that counts invocations; output is the input bracketed so
/// tests can tell rendered markup from raw text.
#[derive(Default)]
pub struct CountingRenderer {
    calls: Mutex<usize>,
}

impl CountingRenderer {
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Renderer for CountingRenderer {
    fn render(&self, text: &str) -> String {
        *self.calls.lock().unwrap() += 1;
        format!("<p>{text}</p>")
    }
}

/// Confirmation that always declines.
pub struct DenyConfirm;

impl Confirm for DenyConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Build a conversation fixture with the given last-message epoch.
pub fn conversation(id: &str, last_message_secs: Option<f64>) -> serde_json::Value {
    let mut value = serde_json::json!({
        "_id": id,
        "title": format!("Conversation {id}"),
        "model_id": "gpt-test",
        "model_name": "GPT Test",
        "created_at": 1_700_000_000.0,
    });
    if let Some(secs) = last_message_secs {
        value["last_message_at"] = serde_json::json!(secs);
    }
    value
}

/// Build a message fixture.
pub fn message_json(id: &str, role: &str, epoch_secs: f64) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "role": role,
        "content": format!("content of {id}"),
        "created_at": epoch_secs,
    })
}
