//! # Chat API Client
//!
//! HTTP client methods for attachment upload and message history.

use super::client::ApiClient;
use crate::chat::uploader::AttachmentFile;
use crate::core::error::Result;
use crate::core::service::ChatApi;
use reqwest::multipart::{Form, Part};
use shared::dto::chat::{Message, UploadResponse};
use tracing::debug;

impl ApiClient {
    /// Upload a file as the `file` part of a multipart form.
    pub async fn upload_file(&self, file: &AttachmentFile) -> Result<UploadResponse> {
        let url = self.endpoint(&["chat", "upload"])?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;

        if response.status().is_success() {
            let body = response.json::<UploadResponse>().await?;
            debug!(file_name = %file.name, file_url = %body.file_url, "Attachment uploaded");
            Ok(body)
        } else {
            Err(ApiClient::error_from(response).await)
        }
    }

    /// Fetch the conversation between `sender_id` and `contact_id`.
    pub async fn get_history(&self, sender_id: &str, contact_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&["chat", "history", sender_id, contact_id])?;

        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.json::<Vec<Message>>().await?)
        } else {
            Err(ApiClient::error_from(response).await)
        }
    }
}

#[async_trait::async_trait]
impl ChatApi for ApiClient {
    async fn upload_attachment(&self, file: &AttachmentFile) -> Result<UploadResponse> {
        self.upload_file(file).await
    }

    async fn load_history(&self, sender_id: &str, contact_id: &str) -> Result<Vec<Message>> {
        self.get_history(sender_id, contact_id).await
    }
}
