//! Past chat sessions: listing, the history popup, and resume / new-chat events.

use crate::api::ChatBackend;
use crate::error::Result;
use crate::model::{SessionSummary, User};
use crate::storage::{Storage, CURRENT_SESSION_KEY};

/// What the history panel reports upward to the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// Resume an existing session.
    Selected(SessionSummary),
    /// Start over with no session; creation is left to whoever handles it.
    NewChat,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryPanel {
    sessions: Vec<SessionSummary>,
    open: bool,
    owner: Option<String>,
}

impl HistoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    // -- Listing --

    /// Start a refresh for `user`; with no user the list empties and there is
    /// nothing to fetch.
    pub fn begin_refresh(&mut self, user: Option<&User>) -> Option<String> {
        match user {
            Some(u) => {
                self.owner = Some(u.email.clone());
                Some(u.email.clone())
            }
            None => {
                self.owner = None;
                self.sessions.clear();
                None
            }
        }
    }

    /// Apply sessions fetched for `email`. Returns `false` if it was stale.
    pub fn finish_refresh(&mut self, email: &str, sessions: Vec<SessionSummary>) -> bool {
        if self.owner.as_deref() != Some(email) {
            tracing::debug!(email, "history: dropping stale session list");
            return false;
        }
        self.sessions = sessions;
        true
    }

    pub async fn refresh<B: ChatBackend>(
        &mut self,
        backend: &B,
        user: Option<&User>,
    ) -> Result<()> {
        let Some(email) = self.begin_refresh(user) else {
            return Ok(());
        };
        let sessions = backend.chat_sessions(&email).await?;
        self.finish_refresh(&email, sessions);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.sessions.clear();
        self.owner = None;
        self.open = false;
    }

    // -- Events --

    /// Pick a session: close the popup and persist it as the active pointer.
    pub fn select(&mut self, storage: &Storage, session: SessionSummary) -> Result<HistoryEvent> {
        self.open = false;
        storage.put_json(CURRENT_SESSION_KEY, Some(&session))?;
        tracing::debug!(id = %session.id, "history: session selected");
        Ok(HistoryEvent::Selected(session))
    }

    /// Pick the session at `index` in the current list.
    pub fn select_index(&mut self, storage: &Storage, index: usize) -> Result<Option<HistoryEvent>> {
        match self.sessions.get(index).cloned() {
            Some(session) => self.select(storage, session).map(Some),
            None => Ok(None),
        }
    }

    /// "New chat": clear the persisted pointer.
    pub fn new_chat(&mut self, storage: &Storage) -> Result<HistoryEvent> {
        self.open = false;
        storage.put_json::<SessionSummary>(CURRENT_SESSION_KEY, None)?;
        Ok(HistoryEvent::NewChat)
    }

    /// Record a session that was just created so it shows up without a refetch.
    pub fn remember(&mut self, session: SessionSummary) {
        if !self.sessions.iter().any(|s| s.id == session.id) {
            self.sessions.push(session);
        }
    }

    /// [`remember`](Self::remember), but only into a list that belongs to `email`.
    pub fn remember_for(&mut self, email: &str, session: SessionSummary) -> bool {
        if self.owner.as_deref() != Some(email) {
            return false;
        }
        self.remember(session);
        true
    }
}
