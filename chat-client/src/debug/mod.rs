//! # Logging and Tracing
//!
//! File-based structured logging for the chat client.
//!
//! ## Features
//!
//! - **File-based logging**: `logs/chat-client.log` with daily rotation
//! - **Operation spans**: every send and contact switch runs in a span with a trace ID
//! - **Panic logging**: panics are recorded in the log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! let _guard = chat_client::debug::init();
//!
//! tracing::info!(contact_id = "s-9", message_count = 12, "Loaded chat history");
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `chat_client=debug,info`)
//! - `CHAT_LOG_DIR`: Log directory (default: `logs`)
//! - `CHAT_LOG_STDERR`: Mirror logs to stderr (1=on, 0=off)

pub mod config;
pub mod logger;
pub mod trace_context;

pub use config::DebugConfig;
pub use logger::init as init_logger;
pub use trace_context::{new_trace_id, operation_span};

use tracing_appender::non_blocking::WorkerGuard;

/// Initialize the logging system from the environment.
///
/// Call at startup and hold the returned guard until exit.
pub fn init() -> Option<WorkerGuard> {
    init_logger()
}
