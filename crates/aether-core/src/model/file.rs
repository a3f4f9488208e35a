use serde::{Deserialize, Serialize};

pub const PDF_MIME: &str = "application/pdf";

/// A file the user uploaded earlier. Owned by the server, read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
    /// Vector-store namespace the backend indexed the file under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl UploadedFile {
    /// Entry for the legacy `GET /files` listing, which only carries names.
    pub fn from_name(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: String::new(),
            size: 0,
            namespace: None,
        }
    }

    /// Size in KiB with one decimal, e.g. `"12.5 KB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyFileListResponse {
    #[serde(default)]
    pub files: Vec<String>,
}

/// A local file the user picked for upload, plus the uploader's profile fields.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub name: String,
    pub email: String,
    pub picture: String,
}

/// `POST /upload` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Serialize)]
pub struct SelectedFilesRequest<'a> {
    pub files: &'a [String],
}
