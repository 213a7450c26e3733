//! Trace IDs for correlating one user action across async boundaries
//!
//! A send touches the uploader, the REST client and the transport task. Each
//! action runs inside a span carrying a fresh trace ID, so every log line it
//! produces can be grepped together.

use tracing::Span;
use uuid::Uuid;

/// Generate a new trace ID
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span for one user action, e.g. `operation_span("send")`.
///
/// Attach with `tracing::Instrument::instrument` so the ID follows the future
/// across threads.
pub fn operation_span(operation: &'static str) -> (Span, String) {
    let trace_id = new_trace_id();
    let span = tracing::info_span!("chat_op", op = operation, trace_id = %trace_id);
    (span, trace_id)
}
