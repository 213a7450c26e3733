//! # Common Error Types
//!
//! Consolidated error handling for the chat client.
//!
//! ## Error Categories
//!
//! - **Connection**: Transport failed or dropped. Recovered automatically by the
//!   reconnect loop; surfaced as an event, never as a blocking failure.
//! - **Upload**: Attachment upload failed. Aborts the send, compose state is kept.
//! - **HistoryFetch**: History load failed. The log stays empty.
//! - **Api**: Any other backend REST failure.
//! - **Decode**: A payload from the network did not match the expected schema.
//! - **Validation**: Local input rejected before any network call.
//!
//! An empty send is not an error; see [`crate::chat::SendOutcome::Ignored`].
//!
//! ```rust
//! use chat_client::core::error::ChatError;
//!
//! let err = ChatError::Upload("HTTP 413 Payload Too Large".to_string());
//! assert_eq!(err.to_string(), "Upload failed: HTTP 413 Payload Too Large");
//! ```

use thiserror::Error;

/// Client-wide error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// WebSocket or STOMP level failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Attachment upload failed; the send was aborted.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// History could not be loaded for the selected contact.
    #[error("History fetch failed: {0}")]
    HistoryFetch(String),

    /// Backend REST communication error.
    #[error("API error: {0}")]
    Api(String),

    /// Network payload did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Publish attempted while the transport is not connected.
    #[error("Transport is not connected")]
    NotConnected,

    /// The session was torn down.
    #[error("Chat session is closed")]
    SessionClosed,
}

/// Convenience type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Api(format!("Network error: {}", err))
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ChatError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ChatError::Connection(err.to_string())
    }
}

impl ChatError {
    /// Re-tag an API failure as an upload failure, keeping the message.
    pub(crate) fn into_upload(self) -> Self {
        match self {
            ChatError::Upload(msg) => ChatError::Upload(msg),
            other => ChatError::Upload(other.to_string()),
        }
    }

    /// Re-tag an API failure as a history failure, keeping the message.
    pub(crate) fn into_history(self) -> Self {
        match self {
            ChatError::HistoryFetch(msg) => ChatError::HistoryFetch(msg),
            other => ChatError::HistoryFetch(other.to_string()),
        }
    }
}
