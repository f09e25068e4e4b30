//! The per-page-session context object.
//!
//! Owns every component and wires them together: the directory selects a
//! conversation, the pagination engine fills its history, the transport
//! streams the assistant's reply, and the reducer folds that stream into
//! the rendered list. Constructed once per page session and explicitly
//! disposed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::directory::{ConversationDirectory, RemoveOutcome};
use crate::history::{HistoryLoader, PageCompletion};
use crate::reducer::{StreamReducer, TurnEvent};
use crate::transport::{Transport, TransportEvent, TransportState};
use crate::types::{ChatMessage, ModelInfo, Role};
use crate::view::{
    AlwaysConfirm, ChatView, Confirm, DirectoryView, Notifier, PlainRenderer, Renderer,
    TracingNotifier,
};

/// A live chat client session.
pub struct ChatSession {
    config: ClientConfig,
    api: Arc<ApiClient>,
    notifier: Arc<dyn Notifier>,
    renderer: Box<dyn Renderer>,
    confirm: Box<dyn Confirm>,
    chat_view: Box<dyn ChatView>,
    directory_view: Box<dyn DirectoryView>,
    directory: ConversationDirectory,
    history: HistoryLoader,
    reducer: StreamReducer,
    transport: Transport,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

impl ChatSession {
    pub fn new(
        config: ClientConfig,
        chat_view: Box<dyn ChatView>,
        directory_view: Box<dyn DirectoryView>,
    ) -> Self {
        let api = Arc::new(ApiClient::new(&config));
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        let directory = ConversationDirectory::new(Arc::clone(&api), Arc::clone(&notifier));
        let history = HistoryLoader::new(config.page_size);
        Self {
            config,
            api,
            notifier,
            renderer: Box::new(PlainRenderer),
            confirm: Box::new(AlwaysConfirm),
            chat_view,
            directory_view,
            directory,
            history,
            reducer: StreamReducer::new(),
            transport: Transport::disconnected(),
            events: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.directory =
            ConversationDirectory::new(Arc::clone(&self.api), Arc::clone(&notifier));
        self.notifier = notifier;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_confirm(mut self, confirm: Box<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Open the streaming channel, show the welcome state, and load the
    /// conversation list.
    pub async fn init(&mut self) {
        let (transport, events) = Transport::connect(&self.config, Arc::clone(&self.notifier));
        self.transport = transport;
        self.events = Some(events);

        self.directory_view.show_welcome();
        self.chat_view.clear();
        self.directory.list(self.directory_view.as_mut()).await;
        debug!("session initialized");
    }

    /// Make a conversation active and load its first history page.
    pub async fn select_conversation(&mut self, id: &str) {
        let Some(active_id) = self
            .directory
            .select(id, self.directory_view.as_mut())
            .await
        else {
            return;
        };
        self.chat_view.clear();
        self.history.reset(active_id);
        self.load_page().await;
    }

    /// Create a conversation, then select it.
    pub async fn create_conversation(&mut self, title: &str, system_prompt: &str, model_id: &str) {
        let created = self
            .directory
            .create(title, system_prompt, model_id, self.directory_view.as_mut())
            .await;
        if let Some(id) = created {
            self.select_conversation(&id).await;
        }
    }

    /// Update the active conversation's model and system prompt.
    pub async fn update_settings(&mut self, model_id: &str, system_prompt: &str) {
        self.directory
            .update_settings(model_id, system_prompt, self.directory_view.as_mut())
            .await;
    }

    /// Delete the active conversation (with confirmation).
    pub async fn delete_active(&mut self) {
        let Some(id) = self.directory.active().map(|c| c.id.clone()) else {
            self.notifier.error("No conversation selected");
            return;
        };
        let outcome = self
            .directory
            .remove(&id, self.confirm.as_ref(), self.directory_view.as_mut())
            .await;
        if outcome == (RemoveOutcome::Removed { was_active: true }) {
            self.history.teardown();
            self.chat_view.clear();
        }
    }

    /// Fetch the model catalog for the create/edit forms.
    pub async fn models(&self) -> Vec<ModelInfo> {
        self.directory.models().await
    }

    /// Filter the sidebar by a search query.
    pub fn search(&mut self, query: &str) {
        self.directory.filter(query, self.directory_view.as_mut());
    }

    /// Send user text on the active conversation over the streaming
    /// channel. Refused, with a notice, when no conversation is active or
    /// the channel is not open.
    pub fn send_message(&mut self, text: &str) {
        let content = text.trim();
        if content.is_empty() {
            return;
        }
        let Some(active) = self.directory.active() else {
            self.notifier.error("Cannot send message, no conversation selected");
            return;
        };
        if self.transport.state() != TransportState::Open {
            self.notifier.error("Cannot send message, please retry shortly");
            return;
        }

        let conversation_id = active.id.clone();
        let echo = ChatMessage::user(content);
        self.chat_view.push_live(&echo);

        if let Err(e) = self.transport.send(&conversation_id, Role::User, content) {
            debug!(error = %e, "send refused");
            self.notifier.error("Cannot send message, please retry shortly");
        }
    }

    /// Scroll handler: load the next older page when the view reports the
    /// user near the top of the history. The pagination guard makes this
    /// a no-op while a load is in flight or history is exhausted.
    pub async fn on_scroll_near_top(&mut self) {
        self.load_page().await;
    }

    /// Process transport events until the channel ends. Events already
    /// queued are applied as one batch before a single render flush, so a
    /// burst of deltas costs one render.
    pub async fn run(&mut self) {
        let Some(mut events) = self.events.take() else {
            return;
        };
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
            while let Ok(more) = events.try_recv() {
                self.handle_event(more).await;
            }
            self.reducer
                .flush(self.chat_view.as_mut(), self.renderer.as_ref());
        }
    }

    /// Apply a single transport event. Exposed for drivers that own their
    /// own loop; [`run`](Self::run) is the usual entry point.
    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Disconnected => {
                self.reducer.abort(self.chat_view.as_mut());
            }
            TransportEvent::Frame(frame) => {
                let turn = self.reducer.apply_frame(
                    frame,
                    self.chat_view.as_mut(),
                    self.renderer.as_ref(),
                    self.notifier.as_ref(),
                    Utc::now(),
                );
                if let TurnEvent::Completed { message } = turn {
                    if let Some(id) = message.and_then(|m| m.id) {
                        self.history.register_live_id(id);
                    }
                    // Refresh ordering/last-activity; list() re-applies
                    // the active highlight itself.
                    self.directory.list(self.directory_view.as_mut()).await;
                }
            }
        }
    }

    /// Flush any pending streaming render. Only needed by drivers using
    /// [`handle_event`](Self::handle_event) directly.
    pub fn flush_render(&mut self) {
        self.reducer
            .flush(self.chat_view.as_mut(), self.renderer.as_ref());
    }

    /// End the page session: close the streaming channel for good.
    pub fn dispose(&mut self) {
        self.transport.dispose();
        self.events = None;
        debug!("session disposed");
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    async fn load_page(&mut self) {
        let Some(request) = self.history.begin_page() else {
            return;
        };
        let result = self
            .api
            .fetch_messages(&request.conversation_id, request.page, request.page_size)
            .await;
        match self.history.complete_page(&request, result) {
            PageCompletion::Stale => {}
            PageCompletion::Failed(e) => {
                self.notifier.error(&format!("Failed to load messages: {e}"));
            }
            PageCompletion::Empty { first_page: true } => {
                self.chat_view.show_empty_placeholder();
            }
            PageCompletion::Empty { first_page: false } => {}
            PageCompletion::Loaded {
                messages,
                first_page,
            } => {
                self.chat_view.insert_older(&messages);
                if first_page {
                    self.chat_view.scroll_to_bottom();
                }
            }
        }
    }
}
