//! # Attachment Uploader
//!
//! Uploads a picked file and turns the server's answer into an [`Attachment`]
//! reference that can ride along with a message.

use crate::core::error::{ChatError, Result};
use crate::core::service::ChatApi;
use shared::dto::chat::Attachment;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A local file waiting to be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AttachmentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl AttachmentFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read `path` and guess its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChatError::Validation(format!("cannot read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_from_name(&name);
        Ok(Self { name, mime_type, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reject blobs the backend would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ChatError::Validation("attachment has no file name".to_string()));
        }
        if self.mime_type.trim().is_empty() || !self.mime_type.contains('/') {
            return Err(ChatError::Validation(format!(
                "attachment {} has no valid MIME type",
                self.name
            )));
        }
        if self.bytes.is_empty() {
            return Err(ChatError::Validation(format!("attachment {} is empty", self.name)));
        }
        Ok(())
    }
}

/// MIME type guessed from the file extension; unknown extensions are opaque bytes.
pub fn mime_from_name(name: &str) -> String {
    mime_guess::from_path(name).first_or_octet_stream().to_string()
}

/// Uploads attachments through a [`ChatApi`].
#[derive(Clone)]
pub struct AttachmentUploader {
    api: Arc<dyn ChatApi>,
}

impl AttachmentUploader {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    /// Upload `file`. Every failure comes back as [`ChatError::Upload`] except
    /// local validation, which is reported before any network call.
    pub async fn upload(&self, file: &AttachmentFile) -> Result<Attachment> {
        file.validate()?;

        let response = self.api.upload_attachment(file).await.map_err(|e| {
            warn!(file_name = %file.name, error = %e, "Attachment upload failed");
            e.into_upload()
        })?;

        if response.file_url.trim().is_empty() {
            return Err(ChatError::Upload("server returned an empty fileUrl".to_string()));
        }

        let attachment = Attachment {
            file_name: response.file_name.unwrap_or_else(|| file.name.clone()),
            file_url: response.file_url,
            file_type: response.file_type.unwrap_or_else(|| file.mime_type.clone()),
            file_size: response.file_size.unwrap_or_else(|| file.size()),
        };
        info!(
            file_name = %attachment.file_name,
            file_size = %shared::format_file_size(attachment.file_size),
            "Attachment ready"
        );
        Ok(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared::dto::chat::{Message, UploadResponse};

    struct StubApi {
        upload: Result<UploadResponse>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ChatApi for StubApi {
        async fn upload_attachment(&self, _file: &AttachmentFile) -> Result<UploadResponse> {
            *self.calls.lock() += 1;
            self.upload.clone()
        }

        async fn load_history(&self, _sender_id: &str, _contact_id: &str) -> Result<Vec<Message>> {
            Ok(Vec::new())
        }
    }

    fn uploader(upload: Result<UploadResponse>) -> (AttachmentUploader, Arc<StubApi>) {
        let api = Arc::new(StubApi {
            upload,
            calls: Mutex::new(0),
        });
        (AttachmentUploader::new(api.clone()), api)
    }

    fn photo() -> AttachmentFile {
        AttachmentFile::new("photo.png", "image/png", vec![1, 2, 3, 4])
    }

    #[tokio::test]
    async fn test_upload_fills_missing_fields_from_local_file() {
        let (uploader, _) = uploader(Ok(UploadResponse {
            file_url: "http://x/f.png".to_string(),
            file_name: None,
            file_type: None,
            file_size: None,
        }));

        let attachment = uploader.upload(&photo()).await.unwrap();

        assert_eq!(
            attachment,
            Attachment {
                file_name: "photo.png".to_string(),
                file_url: "http://x/f.png".to_string(),
                file_type: "image/png".to_string(),
                file_size: 4,
            }
        );
    }

    #[tokio::test]
    async fn test_upload_prefers_server_values() {
        let (uploader, _) = uploader(Ok(UploadResponse {
            file_url: "http://x/f.png".to_string(),
            file_name: Some("1697-photo.png".to_string()),
            file_type: None,
            file_size: Some(5),
        }));

        let attachment = uploader.upload(&photo()).await.unwrap();

        assert_eq!(attachment.file_name, "1697-photo.png");
        assert_eq!(attachment.file_size, 5);
    }

    #[tokio::test]
    async fn test_api_failure_becomes_upload_error() {
        let (uploader, _) = uploader(Err(ChatError::Api("HTTP 500: disk full".to_string())));

        let err = uploader.upload(&photo()).await.unwrap_err();

        assert_eq!(err, ChatError::Upload("API error: HTTP 500: disk full".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_file_never_reaches_network() {
        let (uploader, api) = uploader(Err(ChatError::Api("unreachable".to_string())));

        let empty = AttachmentFile::new("photo.png", "image/png", Vec::new());
        let nameless = AttachmentFile::new(" ", "image/png", vec![1]);
        let untyped = AttachmentFile::new("photo", "", vec![1]);

        for file in [empty, nameless, untyped] {
            assert!(matches!(uploader.upload(&file).await, Err(ChatError::Validation(_))));
        }
        assert_eq!(*api.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_empty_file_url_is_rejected() {
        let (uploader, _) = uploader(Ok(UploadResponse {
            file_url: " ".to_string(),
            file_name: None,
            file_type: None,
            file_size: None,
        }));

        assert!(matches!(uploader.upload(&photo()).await, Err(ChatError::Upload(_))));
    }

    #[test]
    fn test_mime_from_name() {
        assert_eq!(mime_from_name("photo.PNG"), "image/png");
        assert_eq!(mime_from_name("report.card.pdf"), "application/pdf");
        assert_eq!(mime_from_name("marks.xlsx"), "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
        assert_eq!(
            mime_from_name("slides.pptx"),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
        assert_eq!(mime_from_name("notes.odt"), "application/vnd.oasis.opendocument.text");
        assert_eq!(mime_from_name("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_from_path_reads_file_and_guesses_type() {
        let path = std::env::temp_dir().join(format!("chat-client-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"homework").await.unwrap();

        let file = AttachmentFile::from_path(&path).await.unwrap();

        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.bytes, b"homework");
        assert!(file.name.ends_with(".txt"));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
