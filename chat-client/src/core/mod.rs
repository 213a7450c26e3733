//! # Core Abstractions
//!
//! Error types and service traits shared by every layer of the chat client.
//!
//! - **[`error`]**: `ChatError` and the `Result<T>` alias
//! - **[`service`]**: `ChatApi` and `MessageTransport` traits for dependency injection
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chat_client::core::service::ChatApi;
//! use chat_client::config::ChatConfig;
//! use chat_client::services::api::ApiClient;
//!
//! let config = ChatConfig::from_env();
//! let api: Arc<dyn ChatApi> = Arc::new(ApiClient::new(&config));
//! ```

pub mod error;
pub mod service;

pub use error::{ChatError, Result};
pub use service::{ChatApi, MessageTransport};
