//! Logging helpers
//!
//! Model replies are arbitrary text of arbitrary size. These helpers keep
//! what ends up in log lines and error messages bounded and free of secrets.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Default number of characters kept by [`preview`] in error messages
pub const DEFAULT_PREVIEW_CHARS: usize = 400;

/// Truncate text for display
///
/// Keeps at most `max_chars` characters (never splitting a UTF-8 sequence)
/// and appends a marker with the full byte length when anything was cut.
///
/// # Example
///
/// ```rust
/// use output_parser::logging::preview;
///
/// assert_eq!(preview("short", 10), "short");
/// assert_eq!(preview("abcdef", 3), "abc... [truncated, 6 bytes total]");
/// ```
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!(
            "{}... [truncated, {} bytes total]",
            &text[..cut],
            text.len()
        ),
    }
}

/// Render a decoded value for a log line
///
/// Strings are shown as-is, anything else as compact JSON; either way the
/// result goes through [`preview`].
pub fn value_preview(value: &Value, max_chars: usize) -> String {
    match value {
        Value::String(s) => preview(s, max_chars),
        other => preview(&other.to_string(), max_chars),
    }
}

/// Format bytes in human-readable form
///
/// # Example
///
/// ```rust
/// use output_parser::logging::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
/// assert_eq!(format_bytes(500), "500 B");
/// ```
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn secret_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(?i)(api[\s_-]?key|apikey)\s*[:=]\s*\S+", "$1: [REDACTED]"),
            (r"(?i)(password|passwd|pwd)\s*[:=]\s*\S+", "$1: [REDACTED]"),
            (r"(?i)(token)\s*[:=]\s*\S+", "$1: [REDACTED]"),
            (r"(?i)(secret)\s*[:=]\s*\S+", "$1: [REDACTED]"),
            (
                r"(?i)(authorization|auth)\s*:\s*bearer\s+\S+",
                "$1: Bearer [REDACTED]",
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

/// Sanitize string for logging (remove sensitive data)
///
/// Models sometimes echo credentials they saw in tool output back into
/// their reasoning. Common secret patterns are replaced with redacted
/// markers before the text reaches a log line.
///
/// # Example
///
/// ```rust
/// use output_parser::logging::sanitize_for_logging;
///
/// let log = "API key: sk-abc123";
/// let sanitized = sanitize_for_logging(log);
/// assert!(sanitized.contains("[REDACTED]"));
/// ```
pub fn sanitize_for_logging(input: &str) -> String {
    let mut result = input.to_string();

    for (re, replacement) in secret_patterns() {
        result = re.replace_all(&result, *replacement).to_string();
    }

    result
}
