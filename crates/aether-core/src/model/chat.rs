use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Text of the synthetic reply appended when any step of a send fails.
pub const ERROR_REPLY: &str = "Error.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

/// One transcript entry. Messages are only ever appended, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            text: text.into(),
        }
    }

    pub fn error() -> Self {
        Self::ai(ERROR_REPLY)
    }
}

/// List-view form of a chat session. This is also what gets persisted as the
/// active session pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn untitled() -> String {
    "Untitled".to_string()
}

impl SessionSummary {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: None,
        }
    }
}

/// `GET /chat-session/{id}` response. Unknown ids come back as `{ "messages": [] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
    pub email: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedSession {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppendMessageRequest<'a> {
    pub email: &'a str,
    pub message: &'a Message,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Title given to sessions the client creates, e.g. `"10/19/2026, 02:41:07 PM"`.
pub fn session_title<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%m/%d/%Y, %I:%M:%S %p").to_string()
}

/// Title stamped with the current local time.
pub fn new_session_title() -> String {
    session_title(&Local::now())
}
