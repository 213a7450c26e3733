//! # Service Traits
//!
//! Seams between the session orchestrator and the network, so the session can
//! run against mocks in tests.

use crate::chat::uploader::AttachmentFile;
use crate::core::error::Result;
use crate::services::transport::ConnectionState;
use async_trait::async_trait;
use shared::dto::chat::{Message, UploadResponse};

/// REST operations the chat pipeline needs from the backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /chat/upload` with the file as a multipart part.
    async fn upload_attachment(&self, file: &AttachmentFile) -> Result<UploadResponse>;

    /// `GET /chat/history/{sender_id}/{contact_id}`, oldest first.
    async fn load_history(&self, sender_id: &str, contact_id: &str) -> Result<Vec<Message>>;
}

/// Publish/subscribe operations of a live broker connection.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Register a topic; it is (re)subscribed every time the connection comes up.
    async fn subscribe(&self, topic: &str) -> Result<()>;

    /// Send `body` to `destination`. Fails with `NotConnected` unless connected.
    async fn publish(&self, destination: &str, body: String) -> Result<()>;

    /// Tear the connection down for good.
    async fn shutdown(&self);
}
