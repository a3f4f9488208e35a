//! The root composer: owns the panels and the active session.
//!
//! [`Workspace`] is the single source of truth for which session is active.
//! Every change goes through [`Workspace::set_session`], which persists the
//! pointer and repoints the chat panel.

use std::time::{Duration, Instant};

use crate::api::ChatBackend;
use crate::auth;
use crate::chat::{ChatPanel, PendingSend, SendApplied, SendOutcome, TranscriptLoad};
use crate::config::AetherConfig;
use crate::error::Result;
use crate::files::{mirror_selection, FilePanel, PickedFile};
use crate::history::{HistoryEvent, HistoryPanel};
use crate::identity::IdentityStore;
use crate::model::{FileUpload, SessionSummary, User};
use crate::storage::{ClientStorage, Storage, CURRENT_SESSION_KEY};

/// Fetches to run after login, on startup or on an explicit refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Email whose files to list.
    pub files: Option<String>,
    /// Email whose sessions to list.
    pub sessions: Option<String>,
    pub transcript: Option<TranscriptLoad>,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    storage: Storage,
    identity: IdentityStore,
    session: Option<SessionSummary>,
    brand: String,
    pub files: FilePanel,
    pub history: HistoryPanel,
    pub chat: ChatPanel,
}

impl Workspace {
    /// Hydrate identity and the session pointer from `storage`.
    ///
    /// The pointer is only restored when a user is present; otherwise it is
    /// removed. A pointer that fails to parse is removed as well.
    pub fn load(storage: Storage, config: &AetherConfig) -> Result<Self> {
        let identity = IdentityStore::load(storage.clone());
        let mut ws = Self {
            storage,
            identity,
            session: None,
            brand: config.ui.brand.clone(),
            files: FilePanel::new(
                Duration::from_secs(config.ui.status_dismiss_secs),
                config.api.legacy_files,
            ),
            history: HistoryPanel::new(),
            chat: ChatPanel::new(),
        };

        if !ws.identity.is_logged_in() {
            ws.storage.remove(CURRENT_SESSION_KEY)?;
            return Ok(ws);
        }

        let restored = match ws.storage.get_json::<SessionSummary>(CURRENT_SESSION_KEY) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "workspace: discarding unreadable session pointer");
                ws.storage.remove(CURRENT_SESSION_KEY)?;
                None
            }
        };
        if let Some(ref s) = restored {
            tracing::debug!(id = %s.id, "workspace: restored active session");
        }
        ws.session = restored;
        ws.chat.set_session(ws.session.as_ref());
        Ok(ws)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn user(&self) -> Option<&User> {
        self.identity.user()
    }

    pub fn session(&self) -> Option<&SessionSummary> {
        self.session.as_ref()
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    // -- Session pointer --

    /// Make `session` active, persist it, and repoint the chat panel.
    pub fn set_session(&mut self, session: Option<SessionSummary>) -> Result<Option<TranscriptLoad>> {
        self.storage.put_json(CURRENT_SESSION_KEY, session.as_ref())?;
        self.session = session;
        Ok(self.chat.set_session(self.session.as_ref()))
    }

    pub fn on_history_event(&mut self, event: HistoryEvent) -> Result<Option<TranscriptLoad>> {
        match event {
            HistoryEvent::Selected(summary) => self.set_session(Some(summary)),
            // Creation is deferred to the first send.
            HistoryEvent::NewChat => {
                self.storage.put_json::<SessionSummary>(CURRENT_SESSION_KEY, None)?;
                self.session = None;
                self.chat.new_chat();
                Ok(None)
            }
        }
    }

    pub fn select_session(&mut self, summary: SessionSummary) -> Result<Option<TranscriptLoad>> {
        let event = self.history.select(&self.storage, summary)?;
        self.on_history_event(event)
    }

    /// Select the `index`-th entry of the session list. `None` if out of range.
    pub fn select_session_at(&mut self, index: usize) -> Result<Option<TranscriptLoad>> {
        match self.history.select_index(&self.storage, index)? {
            Some(event) => self.on_history_event(event),
            None => Ok(None),
        }
    }

    pub fn new_chat(&mut self) -> Result<Option<TranscriptLoad>> {
        let event = self.history.new_chat(&self.storage)?;
        self.on_history_event(event)
    }

    /// Adopt a session that the chat panel created on its first send.
    pub fn adopt_created(&mut self, created: SessionSummary) -> Result<()> {
        self.history.remember(created.clone());
        self.set_session(Some(created))?;
        Ok(())
    }

    // -- Send --

    pub fn begin_send(&mut self, question: &str) -> Option<PendingSend> {
        self.chat.begin_send(self.identity.user(), question)
    }

    pub fn submit(&mut self) -> Option<PendingSend> {
        self.chat.submit(self.identity.user())
    }

    /// Apply a send outcome to the transcript and adopt a created session.
    ///
    /// A session created by a stale send is listed in history for its owner
    /// but never made active.
    pub fn finish_send(&mut self, outcome: SendOutcome) -> Result<()> {
        let email = outcome.email.clone();
        match self.chat.finish_send(outcome) {
            SendApplied::Current(Some(created)) => self.adopt_created(created)?,
            SendApplied::Stale(Some(created)) => {
                tracing::debug!(id = %created.id, "workspace: listing session from a stale send");
                self.history.remember_for(&email, created);
            }
            SendApplied::Current(None) | SendApplied::Stale(None) => {}
        }
        Ok(())
    }

    pub async fn send<B: ChatBackend>(&mut self, backend: &B, question: &str) -> Result<()> {
        let Some(pending) = self.begin_send(question) else {
            return Ok(());
        };
        let outcome = pending.execute(backend).await;
        self.finish_send(outcome)
    }

    // -- Identity --

    /// Commit a profile that came back from the auth exchange.
    pub fn commit_login(&mut self, user: User) -> Result<()> {
        self.identity.set_user(Some(user))
    }

    /// Exchange the credential, then refresh everything tied to the user.
    pub async fn login<B: ChatBackend>(&mut self, backend: &B, credential: &str) -> Result<User> {
        let user = auth::login(backend, &mut self.identity, credential).await?;
        self.refresh_user_views(backend).await;
        Ok(user)
    }

    /// Clear the user and cascade: pointer, file list, selection, session
    /// list and transcript all empty.
    pub fn logout(&mut self) -> Result<()> {
        self.identity.logout()?;
        self.set_session(None)?;
        self.files.reset();
        self.history.reset();
        self.chat.reset();
        Ok(())
    }

    // -- Refresh --

    /// Start refreshes of everything tied to the user. Fields are `None`
    /// where there is nothing to fetch.
    pub fn begin_refresh(&mut self) -> RefreshRequest {
        let user = self.identity.user();
        RefreshRequest {
            files: self.files.begin_refresh(user),
            sessions: self.history.begin_refresh(user),
            transcript: user.and(self.chat.reload()),
        }
    }

    /// Start a refresh of the file list alone, e.g. after an upload.
    pub fn begin_file_refresh(&mut self) -> Option<String> {
        self.files.begin_refresh(self.identity.user())
    }

    pub async fn refresh_files<B: ChatBackend>(&mut self, backend: &B) -> Result<()> {
        self.files.refresh(backend, self.identity.user()).await
    }

    pub async fn refresh_sessions<B: ChatBackend>(&mut self, backend: &B) -> Result<()> {
        self.history.refresh(backend, self.identity.user()).await
    }

    /// Re-fetch the file list, the session list and the active transcript.
    /// Failures are logged and leave the affected view as it was.
    pub async fn refresh_user_views<B: ChatBackend>(&mut self, backend: &B) {
        if let Err(e) = self.refresh_files(backend).await {
            tracing::warn!(error = %e, "workspace: file list refresh failed");
        }
        if let Err(e) = self.refresh_sessions(backend).await {
            tracing::warn!(error = %e, "workspace: session list refresh failed");
        }
        if let Some(load) = self.chat.reload() {
            let result = load.execute(backend).await;
            self.chat.finish_load(load.epoch, result);
        }
    }

    // -- Files --

    pub fn begin_upload(&mut self, picked: PickedFile, now: Instant) -> Option<FileUpload> {
        self.files.begin_upload(self.identity.user(), picked, now)
    }

    /// Upload from either the sidebar or the chat input; both share this path.
    pub async fn upload<B: ChatBackend>(&mut self, backend: &B, picked: PickedFile) -> Option<String> {
        self.files
            .upload(backend, self.identity.user(), picked)
            .await
    }

    pub async fn toggle_file<B: ChatBackend>(&mut self, backend: &B, filename: &str) {
        self.files.toggle_and_sync(backend, filename).await;
    }

    /// Replace the selection and mirror it.
    pub async fn select_files<B: ChatBackend>(&mut self, backend: &B, files: Vec<String>) {
        let snapshot = self.files.set_selection(files);
        mirror_selection(backend, &snapshot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::USER_KEY;

    fn logged_in_storage() -> Storage {
        let storage = Storage::in_memory();
        storage
            .set_json(USER_KEY, &User::new("a@b.com", "Ada"))
            .unwrap();
        storage
    }

    fn config() -> AetherConfig {
        AetherConfig::default_config()
    }

    #[test]
    fn test_restores_pointer_when_logged_in() {
        let storage = logged_in_storage();
        storage
            .set_json(CURRENT_SESSION_KEY, &SessionSummary::new("s1", "First"))
            .unwrap();
        let ws = Workspace::load(storage, &config()).unwrap();
        assert_eq!(ws.session().map(|s| s.id.as_str()), Some("s1"));
        assert_eq!(ws.chat.session_id(), Some("s1"));
        assert!(ws.chat.reload().is_some());
    }

    #[test]
    fn test_drops_pointer_when_logged_out() {
        let storage = Storage::in_memory();
        storage
            .set_json(CURRENT_SESSION_KEY, &SessionSummary::new("s1", "First"))
            .unwrap();
        let ws = Workspace::load(storage.clone(), &config()).unwrap();
        assert!(ws.session().is_none());
        assert!(storage.get(CURRENT_SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_pointer_is_removed() {
        let storage = logged_in_storage();
        storage.set(CURRENT_SESSION_KEY, "{broken").unwrap();
        let ws = Workspace::load(storage.clone(), &config()).unwrap();
        assert!(ws.session().is_none());
        assert!(storage.get(CURRENT_SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_new_chat_survives_reload() {
        let storage = logged_in_storage();
        let mut ws = Workspace::load(storage.clone(), &config()).unwrap();
        ws.select_session(SessionSummary::new("s1", "First")).unwrap();
        assert!(ws.new_chat().unwrap().is_none());

        let reloaded = Workspace::load(storage, &config()).unwrap();
        assert!(reloaded.session().is_none());
        assert!(reloaded.chat.messages().is_empty());
    }

    #[test]
    fn test_select_session_yields_load() {
        let mut ws = Workspace::load(logged_in_storage(), &config()).unwrap();
        let load = ws
            .select_session(SessionSummary::new("s2", "Second"))
            .unwrap()
            .unwrap();
        assert_eq!(load.session_id, "s2");
        assert_eq!(load.epoch, ws.chat.epoch());
    }

    #[test]
    fn test_logout_clears_pointer_and_lists() {
        let storage = logged_in_storage();
        let mut ws = Workspace::load(storage.clone(), &config()).unwrap();
        ws.select_session(SessionSummary::new("s1", "First")).unwrap();
        ws.files.toggle("a.pdf");
        ws.history.remember(SessionSummary::new("s1", "First"));

        ws.logout().unwrap();
        assert!(ws.user().is_none());
        assert!(ws.session().is_none());
        assert!(ws.files.selected().is_empty());
        assert!(ws.history.sessions().is_empty());
        assert!(storage.get(CURRENT_SESSION_KEY).unwrap().is_none());
        assert!(storage.get(USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_begin_refresh_logged_out_is_empty() {
        let mut ws = Workspace::load(Storage::in_memory(), &config()).unwrap();
        assert_eq!(ws.begin_refresh(), RefreshRequest::default());
    }

    #[test]
    fn test_begin_refresh_includes_transcript() {
        let mut ws = Workspace::load(logged_in_storage(), &config()).unwrap();
        ws.select_session(SessionSummary::new("s1", "First")).unwrap();
        let req = ws.begin_refresh();
        assert_eq!(req.files.as_deref(), Some("a@b.com"));
        assert_eq!(req.sessions.as_deref(), Some("a@b.com"));
        assert_eq!(req.transcript.map(|t| t.session_id), Some("s1".to_string()));
    }

    #[test]
    fn test_brand_from_config() {
        let mut cfg = config();
        cfg.ui.brand = "MineAI".into();
        let ws = Workspace::load(Storage::in_memory(), &cfg).unwrap();
        assert_eq!(ws.brand(), "MineAI");
    }
}
