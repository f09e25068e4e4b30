//! Message pagination engine.
//!
//! Backward (older-message) loading of the active conversation's history.
//! The pure bookkeeping lives in [`Cursor`]; [`HistoryLoader`] wraps it
//! with the request tagging that lets completions arriving after a
//! conversation switch be recognized as stale and dropped.
//!
//! Loading is serialized: the `loading` flag is the sole guard against
//! overlapping fetches, set in `begin_page` and released on every
//! completion path (success, failure, or reset).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::ParlorError;
use crate::types::ChatMessage;

/// Per-conversation pagination bookkeeping.
///
/// The loaded-id set suppresses duplicate rendering across overlapping
/// page fetches; it is cleared only by `reset`, never mid-pagination.
#[derive(Debug, Clone)]
pub struct Cursor {
    page: usize,
    page_size: usize,
    has_more: bool,
    loading: bool,
    total: usize,
    loaded_ids: HashSet<String>,
}

/// Result of applying a fetched page to the cursor.
#[derive(Debug, PartialEq)]
pub enum PageOutcome {
    /// New messages to insert, sorted ascending by creation time.
    Appended(Vec<ChatMessage>),
    /// Nothing new; `has_more` is now false and no view mutation happens.
    Exhausted,
}

impl Cursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            has_more: true,
            loading: false,
            total: 0,
            loaded_ids: HashSet::new(),
        }
    }

    /// Back to page 1 with an empty id set.
    pub fn reset(&mut self) {
        let page_size = self.page_size;
        *self = Self::new(page_size);
    }

    /// Acquire the load guard. Returns false while a load is in flight or
    /// no more history is believed to exist.
    pub fn try_begin(&mut self) -> bool {
        if self.loading || !self.has_more {
            return false;
        }
        self.loading = true;
        true
    }

    /// Fold a fetched page in. Drops already-rendered ids, sorts the new
    /// ones ascending by creation time, and advances the page number.
    /// Always releases the load guard.
    pub fn apply_page(&mut self, fetched: Vec<ChatMessage>) -> PageOutcome {
        self.loading = false;
        let fetched_count = fetched.len();

        let mut fresh: Vec<ChatMessage> = fetched
            .into_iter()
            .filter(|m| match &m.id {
                Some(id) => !self.loaded_ids.contains(id),
                None => true,
            })
            .collect();

        if fresh.is_empty() {
            // Everything the server still has is already rendered (or the
            // page was empty); stop asking.
            self.has_more = false;
            return PageOutcome::Exhausted;
        }

        fresh.sort_by_key(|m| creation_instant(m));
        for message in &fresh {
            if let Some(id) = &message.id {
                self.loaded_ids.insert(id.clone());
            }
        }
        self.total += fresh.len();
        self.page += 1;
        self.has_more = fetched_count >= self.page_size;
        PageOutcome::Appended(fresh)
    }

    /// Release the guard after a failed fetch; no further auto-retry.
    pub fn fail(&mut self) {
        self.loading = false;
        self.has_more = false;
    }

    /// Record an id rendered outside pagination (a completed streaming
    /// message) so a later overlapping page cannot duplicate it.
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.loaded_ids.insert(id.into());
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn contains(&self, id: &str) -> bool {
        self.loaded_ids.contains(id)
    }
}

fn creation_instant(message: &ChatMessage) -> DateTime<Utc> {
    message
        .created_at
        .as_ref()
        .and_then(|t| t.resolve())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// A page fetch in flight, tagged with the conversation and cursor
/// generation it was issued for.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub conversation_id: String,
    pub page: usize,
    pub page_size: usize,
    generation: u64,
}

/// Completion of a page fetch, as seen by the driver.
#[derive(Debug)]
pub enum PageCompletion {
    /// The cursor was reset for a different conversation while the fetch
    /// was in flight; the response is discarded.
    Stale,
    /// Fetch failed; the guard is released and backfilling stops.
    Failed(ParlorError),
    /// No new messages. `first_page` distinguishes the empty-conversation
    /// placeholder case from an ordinary end of history.
    Empty { first_page: bool },
    /// New messages ready for the view, sorted ascending.
    Loaded {
        messages: Vec<ChatMessage>,
        first_page: bool,
    },
}

/// Pagination state machine for the active conversation.
#[derive(Debug)]
pub struct HistoryLoader {
    cursor: Cursor,
    conversation_id: Option<String>,
    generation: u64,
}

impl HistoryLoader {
    pub fn new(page_size: usize) -> Self {
        Self {
            cursor: Cursor::new(page_size),
            conversation_id: None,
            generation: 0,
        }
    }

    /// Point the loader at a conversation, resetting the cursor to page 1.
    /// Any fetch still in flight for the previous conversation becomes
    /// stale.
    pub fn reset(&mut self, conversation_id: impl Into<String>) {
        self.conversation_id = Some(conversation_id.into());
        self.generation += 1;
        self.cursor.reset();
    }

    /// Detach from the active conversation entirely.
    pub fn teardown(&mut self) {
        self.conversation_id = None;
        self.generation += 1;
        self.cursor.reset();
    }

    /// Start a page fetch if one may proceed. Returns the tagged request
    /// the driver should issue, or `None` when no conversation is active,
    /// a load is already in flight, or history is exhausted.
    pub fn begin_page(&mut self) -> Option<PageRequest> {
        let conversation_id = self.conversation_id.clone()?;
        if !self.cursor.try_begin() {
            return None;
        }
        Some(PageRequest {
            conversation_id,
            page: self.cursor.page(),
            page_size: self.cursor.page_size(),
            generation: self.generation,
        })
    }

    /// Fold a fetch result back in, dropping it when stale.
    pub fn complete_page(
        &mut self,
        request: &PageRequest,
        result: crate::error::Result<Vec<ChatMessage>>,
    ) -> PageCompletion {
        if request.generation != self.generation {
            // The reset that invalidated this request already released the
            // guard; the response must not touch the new cursor.
            debug!(
                conversation_id = %request.conversation_id,
                page = request.page,
                "dropping stale page response"
            );
            return PageCompletion::Stale;
        }

        let first_page = request.page == 1;
        match result {
            Ok(fetched) => match self.cursor.apply_page(fetched) {
                PageOutcome::Appended(messages) => PageCompletion::Loaded {
                    messages,
                    first_page,
                },
                PageOutcome::Exhausted => PageCompletion::Empty { first_page },
            },
            Err(e) => {
                self.cursor.fail();
                PageCompletion::Failed(e)
            }
        }
    }

    /// See [`Cursor::register_id`].
    pub fn register_live_id(&mut self, id: impl Into<String>) {
        self.cursor.register_id(id);
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }
}
