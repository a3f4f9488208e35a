//! Uploaded-file listing, PDF upload and the selection of files that scope
//! retrieval.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::api::ChatBackend;
use crate::error::{AetherError, Result};
use crate::model::{FileUpload, UploadReceipt, UploadedFile, User, PDF_MIME};

pub const LOGIN_TO_UPLOAD: &str = "Please log in to upload files.";
pub const ONLY_PDF: &str = "Only PDF files are allowed";
pub const UPLOAD_FAILED: &str = "Upload failed.";
/// Shown when the backend accepts an upload without a message of its own.
pub const UPLOADED: &str = "File uploaded.";

/// A local file chosen for upload.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AetherError::InvalidInput(format!("not a file path: {}", path.display()))
            })?;
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let bytes = std::fs::read(path).map_err(|e| {
            AetherError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self {
            filename,
            mime,
            bytes,
        })
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == PDF_MIME
    }
}

/// Inline status line under the upload control. Expires after a fixed delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub shown_at: Instant,
}

/// State behind the file sidebar.
#[derive(Debug, Clone)]
pub struct FilePanel {
    files: Vec<UploadedFile>,
    selected: Vec<String>,
    status: Option<StatusLine>,
    status_ttl: Duration,
    legacy_listing: bool,
    /// Email the current listing belongs to; results for anyone else are stale.
    owner: Option<String>,
}

impl FilePanel {
    pub fn new(status_ttl: Duration, legacy_listing: bool) -> Self {
        Self {
            files: Vec::new(),
            selected: Vec::new(),
            status: None,
            status_ttl,
            legacy_listing,
            owner: None,
        }
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Selected filenames, in the order they were selected.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, filename: &str) -> bool {
        self.selected.iter().any(|f| f == filename)
    }

    // -- Listing --

    /// Start a refresh for `user`. With no user the list empties immediately
    /// and there is nothing to fetch.
    pub fn begin_refresh(&mut self, user: Option<&User>) -> Option<String> {
        match user {
            Some(u) => {
                self.owner = Some(u.email.clone());
                Some(u.email.clone())
            }
            None => {
                self.owner = None;
                self.files.clear();
                None
            }
        }
    }

    /// Apply a listing fetched for `email`. Returns `false` if it was stale.
    pub fn finish_refresh(&mut self, email: &str, files: Vec<UploadedFile>) -> bool {
        if self.owner.as_deref() != Some(email) {
            tracing::debug!(email, "files: dropping stale listing");
            return false;
        }
        self.files = files;
        true
    }

    pub fn legacy_listing(&self) -> bool {
        self.legacy_listing
    }

    pub async fn refresh<B: ChatBackend>(
        &mut self,
        backend: &B,
        user: Option<&User>,
    ) -> Result<()> {
        let Some(email) = self.begin_refresh(user) else {
            return Ok(());
        };
        let files = fetch_files(backend, &email, self.legacy_listing).await?;
        self.finish_refresh(&email, files);
        Ok(())
    }

    /// Drop everything tied to the signed-in user.
    pub fn reset(&mut self) {
        self.files.clear();
        self.selected.clear();
        self.owner = None;
    }

    // -- Upload --

    /// Validate an upload. On rejection the status line explains why and
    /// `None` is returned; nothing may be sent in that case.
    pub fn begin_upload(
        &mut self,
        user: Option<&User>,
        picked: PickedFile,
        now: Instant,
    ) -> Option<FileUpload> {
        match prepare_upload(user, picked) {
            Ok(upload) => Some(upload),
            Err(reason) => {
                self.show_status(reason, now);
                None
            }
        }
    }

    /// Record the upload outcome. Returns `true` when the backend accepted it.
    pub fn finish_upload(&mut self, result: Result<UploadReceipt>, now: Instant) -> bool {
        match result {
            Ok(receipt) => {
                let text = receipt
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UPLOADED.to_string());
                self.show_status(text, now);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "files: upload failed");
                self.show_status(UPLOAD_FAILED, now);
                false
            }
        }
    }

    /// Validate, upload, and on success refresh the listing. Returns the
    /// status text that resulted.
    pub async fn upload<B: ChatBackend>(
        &mut self,
        backend: &B,
        user: Option<&User>,
        picked: PickedFile,
    ) -> Option<String> {
        let Some(upload) = self.begin_upload(user, picked, Instant::now()) else {
            return self.status.as_ref().map(|s| s.text.clone());
        };
        let result = backend.upload(upload).await;
        if self.finish_upload(result, Instant::now()) {
            if let Err(e) = self.refresh(backend, user).await {
                tracing::warn!(error = %e, "files: refresh after upload failed");
            }
        }
        self.status.as_ref().map(|s| s.text.clone())
    }

    // -- Status line --

    pub fn show_status(&mut self, text: impl Into<String>, now: Instant) {
        self.status = Some(StatusLine {
            text: text.into(),
            shown_at: now,
        });
    }

    /// Current status text, unless it has expired by `now`.
    pub fn status_at(&self, now: Instant) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| now.duration_since(s.shown_at) < self.status_ttl)
            .map(|s| s.text.as_str())
    }

    /// Clear an expired status line.
    pub fn tick(&mut self, now: Instant) {
        if self.status.is_some() && self.status_at(now).is_none() {
            self.status = None;
        }
    }

    // -- Selection --

    /// Flip membership of `filename`. Returns the full selection to mirror.
    pub fn toggle(&mut self, filename: &str) -> Vec<String> {
        if let Some(pos) = self.selected.iter().position(|f| f == filename) {
            self.selected.remove(pos);
        } else {
            self.selected.push(filename.to_string());
        }
        self.selected.clone()
    }

    /// Replace the selection wholesale. Duplicates are dropped, first one wins.
    pub fn set_selection(&mut self, files: Vec<String>) -> Vec<String> {
        self.selected.clear();
        for f in files {
            if !self.selected.contains(&f) {
                self.selected.push(f);
            }
        }
        self.selected.clone()
    }

    pub async fn toggle_and_sync<B: ChatBackend>(&mut self, backend: &B, filename: &str) {
        let snapshot = self.toggle(filename);
        mirror_selection(backend, &snapshot).await;
    }
}

/// Gate and validate an upload: a user must be present and the file must be
/// exactly `application/pdf`. The error is the user-facing status text.
pub fn prepare_upload(
    user: Option<&User>,
    picked: PickedFile,
) -> std::result::Result<FileUpload, &'static str> {
    let Some(user) = user else {
        return Err(LOGIN_TO_UPLOAD);
    };
    if !picked.is_pdf() {
        return Err(ONLY_PDF);
    }
    Ok(FileUpload {
        filename: picked.filename,
        mime: picked.mime,
        bytes: picked.bytes,
        name: user.name.clone(),
        email: user.email.clone(),
        picture: user.picture.clone(),
    })
}

pub async fn fetch_files<B: ChatBackend>(
    backend: &B,
    email: &str,
    legacy: bool,
) -> Result<Vec<UploadedFile>> {
    if legacy {
        backend.legacy_files().await
    } else {
        backend.my_files(email).await
    }
}

/// Push the selection to the backend. Fire-and-forget: failures are only logged.
pub async fn mirror_selection<B: ChatBackend>(backend: &B, files: &[String]) {
    match backend.set_selected_files(files).await {
        Ok(()) => tracing::debug!(count = files.len(), "files: selection mirrored"),
        Err(e) => tracing::warn!(error = %e, "files: failed to mirror selection"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> FilePanel {
        FilePanel::new(Duration::from_secs(3), false)
    }

    fn pdf(name: &str) -> PickedFile {
        PickedFile {
            filename: name.into(),
            mime: PDF_MIME.into(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    fn user() -> User {
        User::new("a@b.com", "Ada").with_picture("https://p/a.png")
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut p = panel();
        assert_eq!(p.toggle("a.pdf"), vec!["a.pdf".to_string()]);
        assert_eq!(
            p.toggle("b.pdf"),
            vec!["a.pdf".to_string(), "b.pdf".to_string()]
        );
        assert_eq!(p.toggle("a.pdf"), vec!["b.pdf".to_string()]);
        assert!(!p.is_selected("a.pdf"));
        assert!(p.is_selected("b.pdf"));
    }

    #[test]
    fn test_set_selection_dedups() {
        let mut p = panel();
        p.toggle("old.pdf");
        let mirrored = p.set_selection(vec!["a.pdf".into(), "b.pdf".into(), "a.pdf".into()]);
        assert_eq!(mirrored, vec!["a.pdf".to_string(), "b.pdf".to_string()]);
        assert!(!p.is_selected("old.pdf"));
    }

    #[test]
    fn test_upload_requires_user() {
        let mut p = panel();
        let now = Instant::now();
        assert!(p.begin_upload(None, pdf("a.pdf"), now).is_none());
        assert_eq!(p.status_at(now), Some(LOGIN_TO_UPLOAD));
    }

    #[test]
    fn test_upload_rejects_non_pdf() {
        let mut p = panel();
        let now = Instant::now();
        let picked = PickedFile {
            filename: "notes.txt".into(),
            mime: "text/plain".into(),
            bytes: b"hi".to_vec(),
        };
        assert!(p.begin_upload(Some(&user()), picked, now).is_none());
        assert_eq!(p.status_at(now), Some(ONLY_PDF));
    }

    #[test]
    fn test_upload_carries_profile_fields() {
        let mut p = panel();
        let upload = p
            .begin_upload(Some(&user()), pdf("paper.pdf"), Instant::now())
            .unwrap();
        assert_eq!(upload.filename, "paper.pdf");
        assert_eq!(upload.email, "a@b.com");
        assert_eq!(upload.name, "Ada");
        assert_eq!(upload.picture, "https://p/a.png");
    }

    #[test]
    fn test_finish_upload_shows_backend_message() {
        let mut p = panel();
        let now = Instant::now();
        let ok = p.finish_upload(
            Ok(UploadReceipt {
                message: Some("File uploaded".into()),
                file: None,
            }),
            now,
        );
        assert!(ok);
        assert_eq!(p.status_at(now), Some("File uploaded"));
    }

    #[test]
    fn test_finish_upload_without_message() {
        let mut p = panel();
        let now = Instant::now();
        let receipt = UploadReceipt {
            message: None,
            file: None,
        };
        assert!(p.finish_upload(Ok(receipt), now));
        assert_eq!(p.status_at(now), Some(UPLOADED));
    }

    #[test]
    fn test_finish_upload_failure_is_generic() {
        let mut p = panel();
        let now = Instant::now();
        let ok = p.finish_upload(Err(AetherError::NotLoggedIn), now);
        assert!(!ok);
        assert_eq!(p.status_at(now), Some(UPLOAD_FAILED));
    }

    #[test]
    fn test_status_expires_after_ttl() {
        let mut p = panel();
        let now = Instant::now();
        p.show_status("hello", now);
        assert_eq!(p.status_at(now + Duration::from_millis(2999)), Some("hello"));
        assert!(p.status_at(now + Duration::from_secs(3)).is_none());

        p.tick(now + Duration::from_secs(1));
        assert!(p.status.is_some());
        p.tick(now + Duration::from_secs(4));
        assert!(p.status.is_none());
    }

    #[test]
    fn test_refresh_without_user_clears() {
        let mut p = panel();
        p.owner = Some("a@b.com".into());
        p.files = vec![UploadedFile::from_name("a.pdf")];
        assert!(p.begin_refresh(None).is_none());
        assert!(p.files().is_empty());
    }

    #[test]
    fn test_stale_listing_is_dropped() {
        let mut p = panel();
        p.begin_refresh(Some(&user()));
        let other = User::new("c@d.com", "Cy");
        p.begin_refresh(Some(&other));
        assert!(!p.finish_refresh("a@b.com", vec![UploadedFile::from_name("a.pdf")]));
        assert!(p.files().is_empty());
        assert!(p.finish_refresh("c@d.com", vec![UploadedFile::from_name("c.pdf")]));
        assert_eq!(p.files()[0].filename, "c.pdf");
    }

    #[test]
    fn test_picked_file_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let picked = PickedFile::open(&path).unwrap();
        assert_eq!(picked.filename, "paper.pdf");
        assert!(picked.is_pdf());

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"hi").unwrap();
        assert!(!PickedFile::open(&txt).unwrap().is_pdf());
    }

    #[test]
    fn test_picked_file_missing() {
        assert!(PickedFile::open("/definitely/not/here.pdf").is_err());
    }
}
