use std::time::Instant;

use aether_core::auth::LOGIN_FAILED_ALERT;
use aether_core::chat::TranscriptLoad;
use aether_core::files::PickedFile;
use aether_core::workspace::Workspace;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::event::{AsyncAction, AsyncResult};

/// Ticks an error toast stays up (~5s at 50ms tick).
pub const ERROR_TICKS: u8 = 100;

/// Which screen is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main,
}

/// Which pane receives navigation keys on the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    Files,
    Chat,
}

/// Input mode within the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Compose,
    UploadPath,
}

/// Central application state.
pub struct App {
    pub workspace: Workspace,
    pub screen: Screen,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub should_quit: bool,

    // -- Login --
    pub credential_input: String,
    pub logging_in: bool,

    // -- Files --
    pub file_cursor: usize,
    pub upload_input: String,

    // -- History popup --
    /// 0 is "New chat"; `i + 1` is `sessions[i]`.
    pub history_cursor: usize,

    // -- Chat --
    /// Lines scrolled up from the newest message. 0 follows the transcript.
    pub chat_scroll: u16,
    seen_messages: usize,

    // -- Modal alert and error toast --
    pub alert: Option<String>,
    pub error_message: Option<String>,
    pub error_timer: u8,

    queued: Vec<AsyncAction>,
}

impl App {
    pub fn new(workspace: Workspace) -> Self {
        let screen = if workspace.user().is_some() {
            Screen::Main
        } else {
            Screen::Login
        };
        let mut app = Self {
            workspace,
            screen,
            focus: Focus::Chat,
            input_mode: InputMode::Normal,
            should_quit: false,

            credential_input: String::new(),
            logging_in: false,

            file_cursor: 0,
            upload_input: String::new(),

            history_cursor: 0,

            chat_scroll: 0,
            seen_messages: 0,

            alert: None,
            error_message: None,
            error_timer: 0,

            queued: Vec::new(),
        };
        app.queue_refresh();
        app
    }

    /// Follow-up actions produced outside of key handling.
    pub fn take_queued(&mut self) -> Vec<AsyncAction> {
        std::mem::take(&mut self.queued)
    }

    /// Queue refreshes of the file list, the session list and the transcript.
    pub fn queue_refresh(&mut self) {
        let req = self.workspace.begin_refresh();
        if let Some(email) = req.files {
            self.queued.push(AsyncAction::LoadFiles { email });
        }
        if let Some(email) = req.sessions {
            self.queued.push(AsyncAction::LoadSessions { email });
        }
        if let Some(load) = req.transcript {
            self.queued.push(AsyncAction::LoadTranscript(load));
        }
    }

    /// Process an async result from the worker.
    pub fn handle_result(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::LoggedIn(user) => {
                self.logging_in = false;
                if let Err(e) = self.workspace.commit_login(user) {
                    self.show_error(format!("Failed to save login: {e}"));
                    return;
                }
                self.credential_input.clear();
                self.screen = Screen::Main;
                self.queue_refresh();
            }
            AsyncResult::LoginFailed(msg) => {
                tracing::warn!(error = %msg, "tui: login failed");
                self.logging_in = false;
                self.alert = Some(LOGIN_FAILED_ALERT.to_string());
            }
            AsyncResult::Files { email, files } => {
                if self.workspace.files.finish_refresh(&email, files) {
                    let len = self.workspace.files.files().len();
                    self.file_cursor = self.file_cursor.min(len.saturating_sub(1));
                }
            }
            AsyncResult::Sessions { email, sessions } => {
                self.workspace.history.finish_refresh(&email, sessions);
            }
            AsyncResult::Transcript { epoch, messages } => {
                self.workspace.chat.finish_load(epoch, messages);
            }
            AsyncResult::Sent(outcome) => {
                if let Err(e) = self.workspace.finish_send(outcome) {
                    self.show_error(format!("Failed to save session: {e}"));
                }
            }
            AsyncResult::Uploaded(result) => {
                if self.workspace.files.finish_upload(result, Instant::now()) {
                    if let Some(email) = self.workspace.begin_file_refresh() {
                        self.queued.push(AsyncAction::LoadFiles { email });
                    }
                }
            }
            AsyncResult::Error(msg) => self.show_error(msg),
        }
    }

    /// Handle a key event. Returns an optional async action to dispatch.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        // A blocking alert swallows the next key.
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alert = None;
            }
            return None;
        }

        match self.screen {
            Screen::Login => self.handle_login(key),
            Screen::Main if self.workspace.history.is_open() => self.handle_history(key),
            Screen::Main => match self.input_mode {
                InputMode::Normal => self.handle_normal(key),
                InputMode::Compose => self.handle_compose(key),
                InputMode::UploadPath => self.handle_upload_path(key),
            },
        }
    }

    /// Bracketed paste: tokens and questions are often pasted whole.
    pub fn handle_paste(&mut self, text: &str) {
        match (&self.screen, &self.input_mode) {
            (Screen::Login, _) => self.credential_input.push_str(text.trim()),
            (Screen::Main, InputMode::Compose) => {
                let mut input = self.workspace.chat.input().to_string();
                input.push_str(text);
                self.workspace.chat.set_input(input);
            }
            (Screen::Main, InputMode::UploadPath) => self.upload_input.push_str(text.trim()),
            _ => {}
        }
    }

    fn handle_login(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Enter => {
                let credential = self.credential_input.trim();
                if self.logging_in || credential.is_empty() {
                    return None;
                }
                self.logging_in = true;
                Some(AsyncAction::Login {
                    credential: credential.to_string(),
                })
            }
            KeyCode::Backspace => {
                self.credential_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.credential_input.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Files => Focus::Chat,
                    Focus::Chat => Focus::Files,
                };
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                match self.focus {
                    Focus::Files => self.move_file_cursor(1),
                    Focus::Chat => self.chat_scroll = self.chat_scroll.saturating_sub(1),
                }
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                match self.focus {
                    Focus::Files => self.move_file_cursor(-1),
                    Focus::Chat => self.chat_scroll = self.chat_scroll.saturating_add(1),
                }
                None
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(20);
                None
            }
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(20);
                None
            }
            KeyCode::Char('G') => {
                self.chat_scroll = 0;
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter if self.focus == Focus::Files => {
                self.toggle_file_at_cursor()
            }
            KeyCode::Char('i') | KeyCode::Enter => {
                self.focus = Focus::Chat;
                self.input_mode = InputMode::Compose;
                None
            }
            KeyCode::Char('h') => {
                self.workspace.history.toggle_open();
                self.history_cursor = 0;
                None
            }
            KeyCode::Char('n') => {
                let change = self.workspace.new_chat();
                self.apply_session_change(change)
            }
            KeyCode::Char('u') => {
                self.upload_input.clear();
                self.input_mode = InputMode::UploadPath;
                None
            }
            KeyCode::Char('r') => {
                self.queue_refresh();
                None
            }
            KeyCode::Char('L') => {
                if let Err(e) = self.workspace.logout() {
                    self.show_error(format!("Failed to log out: {e}"));
                    return None;
                }
                self.screen = Screen::Login;
                self.focus = Focus::Chat;
                self.file_cursor = 0;
                self.chat_scroll = 0;
                None
            }
            _ => None,
        }
    }

    fn handle_compose(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            KeyCode::Enter => self.workspace.submit().map(AsyncAction::Send),
            KeyCode::Backspace => {
                self.workspace.chat.pop_char();
                None
            }
            KeyCode::Char(c) => {
                self.workspace.chat.push_char(c);
                None
            }
            _ => None,
        }
    }

    fn handle_upload_path(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let path = self.upload_input.trim().to_string();
                if path.is_empty() {
                    return None;
                }
                match PickedFile::open(&path) {
                    Ok(picked) => self
                        .workspace
                        .begin_upload(picked, Instant::now())
                        .map(AsyncAction::Upload),
                    Err(e) => {
                        self.show_error(e.to_string());
                        None
                    }
                }
            }
            KeyCode::Backspace => {
                self.upload_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.upload_input.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_history(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        let rows = self.workspace.history.sessions().len() + 1;
        match key.code {
            KeyCode::Esc | KeyCode::Char('h') => {
                self.workspace.history.close();
                None
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.history_cursor = (self.history_cursor + 1).min(rows - 1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.history_cursor = self.history_cursor.saturating_sub(1);
                None
            }
            KeyCode::Enter => {
                let change = match self.history_cursor {
                    0 => self.workspace.new_chat(),
                    i => self.workspace.select_session_at(i - 1),
                };
                self.apply_session_change(change)
            }
            _ => None,
        }
    }

    fn apply_session_change(
        &mut self,
        change: aether_core::error::Result<Option<TranscriptLoad>>,
    ) -> Option<AsyncAction> {
        self.chat_scroll = 0;
        match change {
            Ok(load) => load.map(AsyncAction::LoadTranscript),
            Err(e) => {
                self.show_error(format!("Failed to switch session: {e}"));
                None
            }
        }
    }

    fn toggle_file_at_cursor(&mut self) -> Option<AsyncAction> {
        let filename = self
            .workspace
            .files
            .files()
            .get(self.file_cursor)?
            .filename
            .clone();
        let snapshot = self.workspace.files.toggle(&filename);
        Some(AsyncAction::MirrorSelection(snapshot))
    }

    fn move_file_cursor(&mut self, delta: i32) {
        let len = self.workspace.files.files().len();
        if len == 0 {
            self.file_cursor = 0;
            return;
        }
        let current = self.file_cursor as i32;
        self.file_cursor = (current + delta).clamp(0, len as i32 - 1) as usize;
    }

    pub fn show_error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
        self.error_timer = ERROR_TICKS;
    }

    /// Per-frame housekeeping: error toast, upload status expiry and
    /// pinning the transcript to its newest message when it changes.
    pub fn tick(&mut self) {
        self.tick_error();
        self.workspace.files.tick(Instant::now());

        let count = self.workspace.chat.messages().len();
        if count != self.seen_messages {
            self.seen_messages = count;
            self.chat_scroll = 0;
        }
    }

    /// Tick the error timer down.
    pub fn tick_error(&mut self) {
        if self.error_timer > 0 {
            self.error_timer -= 1;
            if self.error_timer == 0 {
                self.error_message = None;
            }
        }
    }
}
