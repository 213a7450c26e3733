//! # Backend API Client Module
//!
//! HTTP client for the chat endpoints of the school backend.
//!
//! ```text
//! api/
//! ├── mod.rs      - Module exports
//! ├── client.rs   - ApiClient struct, URL building, error bodies
//! └── chat.rs     - POST /chat/upload, GET /chat/history/{sender}/{contact}
//! ```

pub mod chat;
pub mod client;

pub use client::ApiClient;
