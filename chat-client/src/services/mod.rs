//! # Services Module
//!
//! External integrations for the chat client.
//!
//! ## Module Overview
//!
//! ```text
//! services/
//! ├── api/          - REST client (attachment upload, history)
//! ├── stomp.rs      - STOMP 1.2 frame codec and heart-beat negotiation
//! └── transport.rs  - Broker connection task with auto-reconnect
//! ```
//!
//! ## Service Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      ChatSession                        │
//! │                                                         │
//! │  ┌──────────────────┐       ┌──────────────────┐        │
//! │  │  ApiClient       │       │  TransportHandle │        │
//! │  │  (api/)          │       │  (transport.rs)  │        │
//! │  └────────┬─────────┘       └────────┬─────────┘        │
//! └───────────┼──────────────────────────┼──────────────────┘
//!             │ HTTP/JSON                │ STOMP over WebSocket
//!             ▼                          ▼
//! ┌─────────────────────┐    ┌─────────────────────────────┐
//! │  /chat/upload       │    │  /ws                        │
//! │  /chat/history/*    │    │  SUBSCRIBE /topic/messages  │
//! │                     │    │  SEND /app/chat             │
//! └─────────────────────┘    └─────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! - **ApiClient**: wraps `reqwest::Client`; clone or share behind `Arc`
//! - **TransportHandle**: all socket I/O lives in one spawned task; the
//!   handle talks to it over channels and can be shared freely

pub mod api;
pub mod stomp;
pub mod transport;

pub use api::ApiClient;
pub use transport::{ConnectionState, TransportEvent, TransportHandle};
