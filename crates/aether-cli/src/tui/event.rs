use aether_core::chat::{PendingSend, SendOutcome, TranscriptLoad};
use aether_core::error::AetherError;
use aether_core::model::*;

/// Actions the UI sends to the async worker task.
#[derive(Debug)]
pub enum AsyncAction {
    /// Exchange an identity credential for the user profile.
    Login { credential: String },
    /// List files for `email`.
    LoadFiles { email: String },
    /// List chat sessions for `email`.
    LoadSessions { email: String },
    /// Fetch the transcript of a session.
    LoadTranscript(TranscriptLoad),
    /// Run a send: create-or-append, ask, append the answer.
    Send(PendingSend),
    /// Upload a validated PDF.
    Upload(FileUpload),
    /// Mirror the full selection to the backend.
    MirrorSelection(Vec<String>),
}

/// Results the async worker sends back to the UI.
#[derive(Debug)]
pub enum AsyncResult {
    LoggedIn(User),
    LoginFailed(String),
    Files {
        email: String,
        files: Vec<UploadedFile>,
    },
    Sessions {
        email: String,
        sessions: Vec<SessionSummary>,
    },
    Transcript {
        epoch: u64,
        messages: Result<Vec<Message>, AetherError>,
    },
    Sent(SendOutcome),
    Uploaded(Result<UploadReceipt, AetherError>),
    /// An error occurred during an async operation.
    Error(String),
}
