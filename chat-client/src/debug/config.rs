//! Logging configuration from environment variables

use std::path::PathBuf;

/// Default filter when neither `RUST_LOG` nor an explicit level is set
pub const DEFAULT_LOG_LEVEL: &str = "chat_client=info,warn";

/// Log file name inside [`DebugConfig::log_dir`]; rotated daily
pub const LOG_FILE_NAME: &str = "chat-client.log";

/// Logging system configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    /// Directory holding the rotated log files
    pub log_dir: PathBuf,
    /// Log level filter (e.g., "chat_client=debug,info")
    pub log_level: String,
    /// Mirror log lines to stderr
    pub log_to_stderr: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_to_stderr: cfg!(feature = "debug-mode"),
        }
    }
}

impl DebugConfig {
    /// Load configuration from environment variables
    ///
    /// - `CHAT_LOG_DIR`: log directory (default `logs`)
    /// - `RUST_LOG`: filter directives (default `chat_client=info,warn`)
    /// - `CHAT_LOG_STDERR`: `1` to also log to stderr
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_dir: lookup("CHAT_LOG_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: lookup("RUST_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            log_to_stderr: lookup("CHAT_LOG_STDERR")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.log_to_stderr),
        }
    }

    /// Path of the current log file, before the rotation date suffix
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}
