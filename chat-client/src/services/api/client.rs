//! # API Client
//!
//! HTTP client for the school backend's chat endpoints.

use crate::config::ChatConfig;
use crate::core::error::{ChatError, Result};
use reqwest::{Client, Response, Url};
use shared::dto::chat::ErrorResponse;

/// HTTP client for communicating with the backend API server.
///
/// Wraps a pooled `reqwest::Client`; cheap to share behind an `Arc`.
pub struct ApiClient {
    pub(crate) client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `config.api_base_url` with the configured request timeout.
    pub fn new(config: &ChatConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.api_base_url.clone(),
        }
    }

    /// Build `{base_url}/{segments...}`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ChatError::Validation(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Validation(format!("base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-2xx response into `ChatError::Api`, preferring the backend's error body.
    pub(crate) async fn error_from(response: Response) -> ChatError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| if text.trim().is_empty() { "Unknown error".to_string() } else { text });
        ChatError::Api(format!("HTTP {}: {}", status.as_u16(), detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let api = ApiClient::new(&ChatConfig::default().with_base_url("http://localhost:8080/api/"));
        let url = api.endpoint(&["chat", "history", "t 1", "s/9"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/chat/history/t%201/s%2F9");
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let api = ApiClient::new(&ChatConfig::default().with_base_url("http://localhost:8080"));
        let url = api.endpoint(&["chat", "upload"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/chat/upload");
    }

    #[test]
    fn test_endpoint_rejects_invalid_base() {
        let api = ApiClient::new(&ChatConfig::default().with_base_url("not a url"));
        assert!(matches!(api.endpoint(&["chat"]), Err(ChatError::Validation(_))));
    }
}
