//! # Shared Data Transfer Objects Library
//!
//! Defines the contract between the chat client and the school backend.
//! All DTOs use JSON serialization via `serde`.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects for REST and broker payloads
//!   - **[`dto::chat`]**: Contacts, messages, attachments
//! - **[`utils`]**: Shared display helpers
//!   - **[`utils::preview`]**: Truncate message content for logs and lists
//!   - **[`utils::format_file_size`]**: Attachment size labels
//!
//! ## Usage
//!
//! ```rust
//! use shared::dto::chat::Message;
//!
//! let raw = r#"{"senderId":"t-1","senderName":"Meera","recipientId":"s-9",
//!              "recipientName":"Ravi","content":"Hello",
//!              "timestamp":"2026-10-16T09:00:00Z","schoolId":"sch-1","session":"2026-27"}"#;
//! let message: Message = serde_json::from_str(raw).unwrap();
//! assert_eq!(message.content, "Hello");
//! ```

pub mod dto;
pub mod utils;

pub use dto::*;
pub use utils::*;
