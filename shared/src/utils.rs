//! # Shared Utility Functions
//!
//! Display helpers used when logging and rendering chat messages.
//!
//! ```rust
//! use shared::utils::{format_file_size, preview};
//!
//! assert_eq!(preview("Homework is due Friday", 8), "Homework...");
//! assert_eq!(format_file_size(2048), "2.0 KB");
//! ```

/// Truncate `text` to at most `max_chars` characters, appending `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text never splits mid-codepoint.
///
/// ```rust
/// use shared::utils::preview;
///
/// assert_eq!(preview("short", 10), "short");
/// assert_eq!(preview("नमस्ते दुनिया", 3), "नमस...");
/// ```
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Human readable size for attachment labels.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
