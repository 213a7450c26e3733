//! # Data Transfer Objects (DTOs)
//!
//! Data structures exchanged with the chat backend, both over REST and as
//! STOMP message bodies.
//!
//! ## Module Organization
//!
//! - [`chat`] - Contacts, messages, attachments, upload responses
//!
//! ## Serialization Format
//!
//! - **Field naming**: camelCase (`#[serde(rename_all = "camelCase")]`), matching the backend
//! - **Optional fields**: Omitted when `None` using `#[serde(skip_serializing_if = "Option::is_none")]`
//! - **All types**: Implement both `Serialize` and `Deserialize`
//!
//! ## Example JSON
//!
//! ```text
//! SEND
//! destination:/app/chat
//! content-type:application/json
//!
//! {
//!   "senderId": "t-1",
//!   "senderName": "Meera",
//!   "recipientId": "s-9",
//!   "recipientName": "Ravi",
//!   "content": "Hello",
//!   "timestamp": "2026-10-16T09:00:00.000Z",
//!   "schoolId": "sch-1",
//!   "session": "2026-27"
//! }
//! ```

pub mod chat;

pub use chat::*;
