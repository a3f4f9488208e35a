#![allow(unused_imports, dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use aether_core::api::ChatBackend;
use aether_core::config::AetherConfig;
use aether_core::error::{AetherError, Result};
use aether_core::model::*;
use aether_core::storage::{Storage, USER_KEY};
use aether_core::workspace::Workspace;

/// One backend request, in the shape it went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AuthGoogle(String),
    MyFiles(String),
    LegacyFiles,
    Upload { filename: String, email: String },
    SelectedFiles(Vec<String>),
    ChatSessions(String),
    CreateSession(NewSessionRequestRecord),
    SessionMessages(String),
    AppendMessage { session: String, message: Message },
    Ask(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSessionRequestRecord {
    pub email: String,
    pub title: String,
    pub message: Option<Message>,
}

/// Which endpoints should fail with a 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Auth,
    MyFiles,
    Upload,
    SelectedFiles,
    ChatSessions,
    CreateSession,
    SessionMessages,
    AppendMessage,
    Ask,
}

/// In-process `ChatBackend` that records every call in order.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Endpoint>>,
    pub profile: Option<User>,
    pub answer: String,
    pub files: Vec<UploadedFile>,
    pub sessions: Vec<SessionSummary>,
    pub transcripts: HashMap<String, Vec<Message>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            profile: Some(test_user()),
            answer: "Hi there".to_string(),
            ..Default::default()
        }
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call, endpoint: Endpoint) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&endpoint) {
            return Err(AetherError::Status {
                endpoint: format!("{endpoint:?}"),
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

impl ChatBackend for RecordingBackend {
    async fn auth_google(&self, credential: &str) -> Result<User> {
        self.record(Call::AuthGoogle(credential.to_string()), Endpoint::Auth)?;
        self.profile.clone().ok_or(AetherError::Status {
            endpoint: "/auth/google".into(),
            status: 401,
            body: "invalid token".into(),
        })
    }

    async fn my_files(&self, email: &str) -> Result<Vec<UploadedFile>> {
        self.record(Call::MyFiles(email.to_string()), Endpoint::MyFiles)?;
        Ok(self.files.clone())
    }

    async fn legacy_files(&self) -> Result<Vec<UploadedFile>> {
        self.record(Call::LegacyFiles, Endpoint::MyFiles)?;
        Ok(self.files.clone())
    }

    async fn upload(&self, upload: FileUpload) -> Result<UploadReceipt> {
        self.record(
            Call::Upload {
                filename: upload.filename.clone(),
                email: upload.email.clone(),
            },
            Endpoint::Upload,
        )?;
        Ok(UploadReceipt {
            message: Some(format!("Uploaded {}", upload.filename)),
            file: None,
        })
    }

    async fn set_selected_files(&self, files: &[String]) -> Result<()> {
        self.record(Call::SelectedFiles(files.to_vec()), Endpoint::SelectedFiles)
    }

    async fn chat_sessions(&self, email: &str) -> Result<Vec<SessionSummary>> {
        self.record(Call::ChatSessions(email.to_string()), Endpoint::ChatSessions)?;
        Ok(self.sessions.clone())
    }

    async fn create_session(&self, request: &NewSessionRequest) -> Result<String> {
        self.record(
            Call::CreateSession(NewSessionRequestRecord {
                email: request.email.clone(),
                title: request.title.clone(),
                message: request.message.clone(),
            }),
            Endpoint::CreateSession,
        )?;
        Ok(uuid::Uuid::now_v7().to_string())
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        self.record(
            Call::SessionMessages(session_id.to_string()),
            Endpoint::SessionMessages,
        )?;
        Ok(self.transcripts.get(session_id).cloned().unwrap_or_default())
    }

    async fn append_message(&self, session_id: &str, _email: &str, message: &Message) -> Result<()> {
        self.record(
            Call::AppendMessage {
                session: session_id.to_string(),
                message: message.clone(),
            },
            Endpoint::AppendMessage,
        )
    }

    async fn ask(&self, question: &str) -> Result<String> {
        self.record(Call::Ask(question.to_string()), Endpoint::Ask)?;
        Ok(self.answer.clone())
    }
}

pub fn test_user() -> User {
    User::new("a@b.com", "Ada").with_picture("https://example.com/ada.png")
}

/// Storage that already holds a signed-in user.
pub fn logged_in_storage() -> Storage {
    let storage = Storage::in_memory();
    storage.set_json(USER_KEY, &test_user()).unwrap();
    storage
}

pub fn workspace(storage: Storage) -> Workspace {
    Workspace::load(storage, &AetherConfig::default_config()).unwrap()
}
