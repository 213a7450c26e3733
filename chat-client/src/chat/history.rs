//! # History Loader
//!
//! Fetches the stored conversation for a `(sender, contact)` pair.

use crate::core::error::Result;
use crate::core::service::ChatApi;
use shared::dto::chat::Message;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct HistoryLoader {
    api: Arc<dyn ChatApi>,
}

impl HistoryLoader {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    /// Messages in server order. Failures come back as `ChatError::HistoryFetch`.
    pub async fn load(&self, sender_id: &str, contact_id: &str) -> Result<Vec<Message>> {
        match self.api.load_history(sender_id, contact_id).await {
            Ok(messages) => {
                info!(
                    sender_id = %sender_id,
                    contact_id = %contact_id,
                    message_count = messages.len(),
                    "Loaded chat history"
                );
                Ok(messages)
            }
            Err(e) => {
                warn!(sender_id = %sender_id, contact_id = %contact_id, error = %e, "Failed to load chat history");
                Err(e.into_history())
            }
        }
    }
}
