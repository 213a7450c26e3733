//! Chat client configuration from environment variables

use crate::chat::session::EchoPolicy;
use std::time::Duration;

/// Default backend base URL when `CHAT_API_BASE_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";
/// Broadcast topic carrying every chat message.
pub const DEFAULT_SUBSCRIBE_TOPIC: &str = "/topic/messages";
/// Broker destination for outgoing messages.
pub const DEFAULT_SEND_DESTINATION: &str = "/app/chat";

/// Connection and endpoint settings for one chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// REST base URL; the WebSocket endpoint is derived from it.
    pub api_base_url: String,
    /// Topic subscribed for incoming messages
    pub subscribe_topic: String,
    /// Destination outgoing messages are published to
    pub send_destination: String,
    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Heart-beat interval advertised in both directions
    pub heartbeat_interval: Duration,
    /// Timeout for REST calls
    pub request_timeout: Duration,
    /// What to do when the broker echoes our own message back
    pub echo_policy: EchoPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            subscribe_topic: DEFAULT_SUBSCRIBE_TOPIC.to_string(),
            send_destination: DEFAULT_SEND_DESTINATION.to_string(),
            reconnect_delay: Duration::from_millis(5000),
            heartbeat_interval: Duration::from_millis(4000),
            request_timeout: Duration::from_secs(10),
            echo_policy: EchoPolicy::default(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset or unparsable values fall back to defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        Self {
            api_base_url: lookup("CHAT_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            subscribe_topic: lookup("CHAT_SUBSCRIBE_TOPIC").unwrap_or(defaults.subscribe_topic),
            send_destination: lookup("CHAT_SEND_DESTINATION").unwrap_or(defaults.send_destination),
            reconnect_delay: millis("CHAT_RECONNECT_DELAY_MS", defaults.reconnect_delay),
            heartbeat_interval: millis("CHAT_HEARTBEAT_MS", defaults.heartbeat_interval),
            request_timeout: lookup("CHAT_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            echo_policy: lookup("CHAT_ECHO_POLICY")
                .and_then(|v| EchoPolicy::parse(&v))
                .unwrap_or(defaults.echo_policy),
        }
    }

    /// Same settings against a different backend.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_echo_policy(mut self, policy: EchoPolicy) -> Self {
        self.echo_policy = policy;
        self
    }

    /// Broker endpoint: the base URL with its scheme switched to ws/wss and `/ws` appended.
    pub fn ws_url(&self) -> String {
        let base = &self.api_base_url;
        let switched = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.clone()
        };
        format!("{}/ws", switched)
    }

    /// Host part of the base URL, sent as the STOMP `host` header.
    pub fn host(&self) -> String {
        let without_scheme = self
            .api_base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.api_base_url);
        without_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ChatConfig::from_vars(|_| None);
        assert_eq!(config, ChatConfig::default());
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.heartbeat_interval, Duration::from_millis(4000));
    }

    #[test]
    fn test_overrides_from_vars() {
        let env = vars(&[
            ("CHAT_API_BASE_URL", "https://school.example.org/"),
            ("CHAT_RECONNECT_DELAY_MS", "250"),
            ("CHAT_HEARTBEAT_MS", "0"),
            ("CHAT_REQUEST_TIMEOUT_SECS", "3"),
            ("CHAT_ECHO_POLICY", "show_all"),
        ]);
        let config = ChatConfig::from_vars(|k| env.get(k).cloned());

        assert_eq!(config.api_base_url, "https://school.example.org");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.heartbeat_interval, Duration::ZERO);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.echo_policy, EchoPolicy::ShowAll);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let env = vars(&[("CHAT_RECONNECT_DELAY_MS", "soon"), ("CHAT_ECHO_POLICY", "maybe")]);
        let config = ChatConfig::from_vars(|k| env.get(k).cloned());

        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.echo_policy, EchoPolicy::SuppressOwnEchoes);
    }

    #[test]
    fn test_ws_url_switches_scheme() {
        let config = ChatConfig::default().with_base_url("http://localhost:8080");
        assert_eq!(config.ws_url(), "ws://localhost:8080/ws");

        let config = ChatConfig::default().with_base_url("https://school.example.org/api/");
        assert_eq!(config.ws_url(), "wss://school.example.org/api/ws");
    }

    #[test]
    fn test_host_strips_scheme_port_and_path() {
        let config = ChatConfig::default().with_base_url("https://school.example.org:8443/api");
        assert_eq!(config.host(), "school.example.org");
    }
}
