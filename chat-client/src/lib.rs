//! # School Chat Client - Library Root
//!
//! Client-side session manager for one-to-one chat between school users.
//! The library owns everything behind the chat widget: the broker
//! connection, contact selection, history, attachments and the send flow.
//! Rendering is left to the host.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              chat-client (this crate)                  │
//! ├────────────────────────────────────────────────────────┤
//! │  chat::ChatSession     - orchestrates the flows below  │
//! │  chat::uploader        - multipart attachment upload   │
//! │  chat::assembler       - builds outgoing messages      │
//! │  chat::history         - loads a conversation          │
//! │  services::transport   - STOMP over WebSocket          │
//! │  services::api         - REST client (reqwest)         │
//! └────────────────────────────────────────────────────────┘
//!          │                              │
//!          │ HTTP                         │ WebSocket
//!          ▼                              ▼
//! ┌─────────────────┐          ┌─────────────────────────┐
//! │  /chat/upload   │          │   /ws  (STOMP broker)   │
//! │  /chat/history  │          │   /topic/messages       │
//! └─────────────────┘          └─────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chat_client::{ChatConfig, ChatSession, SenderIdentity};
//! use shared::Contact;
//!
//! # async fn run() -> chat_client::Result<()> {
//! let config = ChatConfig::from_env();
//! let me = SenderIdentity::new("t-1", "Meera", "sch-1", "2026-27");
//!
//! let session = ChatSession::start(&config, me).await?;
//! session.select_contact(Contact::new("s-9", "Ravi")).await?;
//! session.set_compose_input("Hello");
//! session.send().await?;
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## State Management
//!
//! Session state sits behind a `parking_lot::RwLock` and is locked briefly;
//! no lock is held across an `.await`. Host notifications flow out through a
//! bounded `async_channel` of [`SessionEvent`]s handed out by
//! [`ChatSession::events`].

pub mod chat;
pub mod config;
pub mod core;
pub mod debug;
pub mod services;

pub use chat::{
    AttachmentFile, ChatSession, EchoPolicy, HistoryOutcome, IgnoreReason, SendOutcome, SenderIdentity, SessionEvent,
};
pub use config::ChatConfig;
pub use core::{ChatError, Result};
pub use services::transport::ConnectionState;
