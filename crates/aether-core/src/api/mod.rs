mod http;

pub use http::HttpBackend;

use crate::error::Result;
use crate::model::*;

/// The chat backend's HTTP surface. `HttpBackend` talks to the real server;
/// tests substitute an in-process recorder.
pub trait ChatBackend: Send + Sync {
    // -- Auth --

    /// `POST /auth/google` with the third-party credential as a bearer token.
    fn auth_google(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<User>> + Send;

    // -- Files --

    /// `GET /my-files?email=`
    fn my_files(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Vec<UploadedFile>>> + Send;

    /// `GET /files`: the early, unscoped listing that only carries filenames.
    fn legacy_files(&self) -> impl std::future::Future<Output = Result<Vec<UploadedFile>>> + Send;

    /// `POST /upload` as multipart form data.
    fn upload(
        &self,
        upload: FileUpload,
    ) -> impl std::future::Future<Output = Result<UploadReceipt>> + Send;

    /// `POST /selected-files` with the complete current selection.
    fn set_selected_files(
        &self,
        files: &[String],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    // -- Sessions --

    /// `GET /chat-sessions?email=`
    fn chat_sessions(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>>> + Send;

    /// `POST /chat-session`. Returns the new session id.
    fn create_session(
        &self,
        request: &NewSessionRequest,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// `GET /chat-session/{id}`
    fn session_messages(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Message>>> + Send;

    /// `POST /chat-session/{id}/message`
    fn append_message(
        &self,
        session_id: &str,
        email: &str,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    // -- Answers --

    /// `POST /chat` with the question text only.
    fn ask(&self, question: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}
