use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use super::ChatBackend;
use crate::config::ApiConfig;
use crate::error::{AetherError, Result};
use crate::model::*;

/// `ChatBackend` over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Join path segments onto the base URL, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AetherError::Config(format!("base URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_for_email(&self, segment: &str, email: &str) -> Result<Url> {
        let mut url = self.endpoint(&[segment])?;
        url.query_pairs_mut().append_pair("email", email);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let endpoint = url.path().to_string();
        let response = self.client.get(url).send().await?;
        let response = check_status(response, &endpoint).await?;
        Ok(response.json().await?)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| AetherError::Config(format!("invalid api.base_url '{raw}': {e}")))
}

/// Turn a non-success response into `AetherError::Status`, keeping the body for context.
async fn check_status(response: Response, endpoint: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".into());
    tracing::debug!(endpoint, status, "api: non-success response");
    Err(AetherError::Status {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

impl ChatBackend for HttpBackend {
    async fn auth_google(&self, credential: &str) -> Result<User> {
        let url = self.endpoint(&["auth", "google"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(credential)
            .send()
            .await?;
        let response = check_status(response, "/auth/google").await?;
        let auth: AuthResponse = response.json().await?;
        Ok(auth.into_user())
    }

    async fn my_files(&self, email: &str) -> Result<Vec<UploadedFile>> {
        let url = self.endpoint_for_email("my-files", email)?;
        let list: FileListResponse = self.get_json(url).await?;
        Ok(list.files)
    }

    async fn legacy_files(&self) -> Result<Vec<UploadedFile>> {
        let url = self.endpoint(&["files"])?;
        let list: LegacyFileListResponse = self.get_json(url).await?;
        Ok(list.files.into_iter().map(UploadedFile::from_name).collect())
    }

    async fn upload(&self, upload: FileUpload) -> Result<UploadReceipt> {
        let url = self.endpoint(&["upload"])?;
        let size = upload.bytes.len();
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime)?;
        let form = Form::new()
            .part("file", part)
            .text("name", upload.name)
            .text("email", upload.email)
            .text("picture", upload.picture);

        tracing::debug!(filename = %upload.filename, size, "api: uploading file");
        let response = self.client.post(url).multipart(form).send().await?;
        let response = check_status(response, "/upload").await?;
        Ok(response.json().await?)
    }

    async fn set_selected_files(&self, files: &[String]) -> Result<()> {
        let url = self.endpoint(&["selected-files"])?;
        let response = self
            .client
            .post(url)
            .json(&SelectedFilesRequest { files })
            .send()
            .await?;
        check_status(response, "/selected-files").await?;
        Ok(())
    }

    async fn chat_sessions(&self, email: &str) -> Result<Vec<SessionSummary>> {
        let url = self.endpoint_for_email("chat-sessions", email)?;
        let sessions: Option<Vec<SessionSummary>> = self.get_json(url).await?;
        Ok(sessions.unwrap_or_default())
    }

    async fn create_session(&self, request: &NewSessionRequest) -> Result<String> {
        let url = self.endpoint(&["chat-session"])?;
        let response = self.client.post(url).json(request).send().await?;
        let response = check_status(response, "/chat-session").await?;
        let created: CreatedSession = response.json().await?;
        Ok(created.id)
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&["chat-session", session_id])?;
        let detail: SessionDetail = self.get_json(url).await?;
        Ok(detail.messages)
    }

    async fn append_message(&self, session_id: &str, email: &str, message: &Message) -> Result<()> {
        let url = self.endpoint(&["chat-session", session_id, "message"])?;
        let endpoint = url.path().to_string();
        let response = self
            .client
            .post(url)
            .json(&AppendMessageRequest { email, message })
            .send()
            .await?;
        check_status(response, &endpoint).await?;
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<String> {
        let url = self.endpoint(&["chat"])?;
        let response = self
            .client
            .post(url)
            .json(&ChatRequest { question })
            .send()
            .await?;
        let response = check_status(response, "/chat").await?;
        let answer: ChatResponse = response.json().await?;
        Ok(answer.answer)
    }
}
