//! Conversation directory: list, selection, and CRUD glue.
//!
//! Every operation degrades to a notification on failure; nothing here
//! propagates errors to callers. The active conversation is the single
//! nullable selection the rest of the client hangs off.

use std::sync::Arc;

use tracing::debug;

use crate::api::ApiClient;
use crate::types::{Conversation, ConversationSettings, ModelInfo, NewConversation};
use crate::view::{Confirm, DirectoryView, Notifier};

/// Result of a remove operation, as the session driver sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// User declined the confirmation, or the id was empty.
    Cancelled,
    /// Server call failed; already notified.
    Failed,
    /// Removed. `was_active` means the message view must be torn down.
    Removed { was_active: bool },
}

/// The sidebar list of conversations and the active selection.
pub struct ConversationDirectory {
    api: Arc<ApiClient>,
    notifier: Arc<dyn Notifier>,
    conversations: Vec<Conversation>,
    active: Option<Conversation>,
}

impl ConversationDirectory {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            conversations: Vec::new(),
            active: None,
        }
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.as_ref()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Fetch and re-render the list, sorted descending by most recent
    /// activity. The active highlight survives the refresh when the
    /// active conversation is still present.
    pub async fn list(&mut self, view: &mut dyn DirectoryView) {
        let mut fetched = match self.api.list_conversations().await {
            Ok(conversations) => conversations,
            Err(e) => {
                self.notifier.error(&format!("Failed to load conversations: {e}"));
                return;
            }
        };

        // Descending by last activity; undated ones sink to the bottom.
        fetched.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));

        // The refreshed list is the source of truth for the active
        // conversation's metadata too.
        if let Some(active) = &self.active {
            if let Some(updated) = fetched.iter().find(|c| c.id == active.id) {
                self.active = Some(updated.clone());
            }
        }

        self.conversations = fetched;
        let active_id = self.active.as_ref().map(|c| c.id.clone());
        view.render_list(&self.conversations, active_id.as_deref());
        debug!(count = self.conversations.len(), "conversation list refreshed");
    }

    /// Make a conversation active. Returns its id on success so the
    /// caller can reset the pagination engine for it.
    pub async fn select(&mut self, id: &str, view: &mut dyn DirectoryView) -> Option<String> {
        if id.is_empty() {
            self.notifier.error("Conversation id must not be empty");
            return None;
        }
        match self.api.get_conversation(id).await {
            Ok(conversation) => {
                // One atomic update: active state, detail pane, control
                // enablement, list highlight.
                view.show_active(&conversation);
                let active_id = conversation.id.clone();
                self.active = Some(conversation);
                view.render_list(&self.conversations, Some(&active_id));
                Some(active_id)
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to open conversation: {e}"));
                None
            }
        }
    }

    /// Create a conversation. Title and model are mandatory, checked
    /// before any network call. Returns the new id for selection.
    pub async fn create(
        &mut self,
        title: &str,
        system_prompt: &str,
        model_id: &str,
        view: &mut dyn DirectoryView,
    ) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            self.notifier.error("A conversation title is required");
            return None;
        }
        if model_id.is_empty() {
            self.notifier.error("A model must be selected");
            return None;
        }

        let new = NewConversation {
            title: title.to_string(),
            system_prompt: system_prompt.trim().to_string(),
            model_id: model_id.to_string(),
        };
        match self.api.create_conversation(&new).await {
            Ok(conversation) => {
                let id = conversation.id.clone();
                self.list(view).await;
                Some(id)
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to create conversation: {e}"));
                None
            }
        }
    }

    /// Update the active conversation's model and system prompt. The
    /// server's returned representation replaces local state wholesale.
    pub async fn update_settings(
        &mut self,
        model_id: &str,
        system_prompt: &str,
        view: &mut dyn DirectoryView,
    ) -> bool {
        let Some(active) = &self.active else {
            self.notifier.error("No conversation selected");
            return false;
        };
        if model_id.is_empty() {
            self.notifier.error("A model must be selected");
            return false;
        }

        let settings = ConversationSettings {
            model_id: model_id.to_string(),
            system_prompt: system_prompt.trim().to_string(),
        };
        match self.api.update_conversation(&active.id, &settings).await {
            Ok(updated) => {
                view.show_active(&updated);
                self.active = Some(updated);
                self.notifier.success("Conversation settings updated");
                true
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to update settings: {e}"));
                false
            }
        }
    }

    /// Delete a conversation after confirmation. When the active one is
    /// removed, active state clears and the welcome placeholder shows.
    pub async fn remove(
        &mut self,
        id: &str,
        confirm: &dyn Confirm,
        view: &mut dyn DirectoryView,
    ) -> RemoveOutcome {
        if id.is_empty() {
            self.notifier.error("Conversation id must not be empty");
            return RemoveOutcome::Cancelled;
        }
        if !confirm.confirm("Delete this conversation? This cannot be undone.") {
            return RemoveOutcome::Cancelled;
        }

        if let Err(e) = self.api.delete_conversation(id).await {
            self.notifier.error(&format!("Failed to delete conversation: {e}"));
            return RemoveOutcome::Failed;
        }

        let was_active = self.active.as_ref().is_some_and(|c| c.id == id);
        if was_active {
            self.active = None;
            view.show_welcome();
        }
        self.list(view).await;
        self.notifier.success("Conversation deleted");
        RemoveOutcome::Removed { was_active }
    }

    /// Fetch the model catalog for the create/edit forms.
    pub async fn models(&self) -> Vec<ModelInfo> {
        match self.api.list_models().await {
            Ok(models) => models,
            Err(e) => {
                self.notifier.error(&format!("Failed to load models: {e}"));
                Vec::new()
            }
        }
    }

    /// Case-insensitive substring filter over the loaded list, matching
    /// title and model name. No network; purely a display concern.
    pub fn filter(&self, query: &str, view: &mut dyn DirectoryView) {
        let query = query.trim().to_lowercase();
        let visible: Vec<String> = self
            .conversations
            .iter()
            .filter(|c| {
                query.is_empty()
                    || c.title.to_lowercase().contains(&query)
                    || c.model_name
                        .as_deref()
                        .is_some_and(|m| m.to_lowercase().contains(&query))
            })
            .map(|c| c.id.clone())
            .collect();
        view.apply_filter(&visible);
    }
}
