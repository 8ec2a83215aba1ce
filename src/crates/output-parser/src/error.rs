//! Parse error taxonomy
//!
//! Every failure of [`OutputParser`](crate::OutputParser) is one of three
//! kinds. The caller decides what to do with it (usually re-prompt the
//! model); the parser never retries or patches a result.

use crate::decoder::{DecodeError, DecodedValue};
use crate::logging::{preview, value_preview, DEFAULT_PREVIEW_CHARS};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for parse operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors returned by [`OutputParser`](crate::OutputParser)
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The reply could not be decoded
    ///
    /// Carries the original text exactly as the model produced it, before
    /// normalization.
    #[error("Could not parse invalid json: {}", preview(.raw, DEFAULT_PREVIEW_CHARS))]
    InvalidJson {
        raw: String,
        #[source]
        source: DecodeError,
    },

    /// A tool was selected but its entry is malformed
    #[error("Incomplete tool args ({reason}): {}", value_preview(.decoded, DEFAULT_PREVIEW_CHARS))]
    IncompleteTool {
        decoded: DecodedValue,
        reason: String,
    },

    /// The `tasks` entry is missing or is not a list
    #[error("Incomplete tasks ({reason}): {}", value_preview(.decoded, DEFAULT_PREVIEW_CHARS))]
    IncompleteTasks {
        decoded: DecodedValue,
        reason: String,
    },
}

impl ParseError {
    pub(crate) fn invalid_json(raw: &str, source: DecodeError) -> Self {
        Self::InvalidJson {
            raw: raw.to_string(),
            source,
        }
    }

    pub(crate) fn incomplete_tool(decoded: DecodedValue, reason: impl Into<String>) -> Self {
        Self::IncompleteTool {
            decoded,
            reason: reason.into(),
        }
    }

    pub(crate) fn incomplete_tasks(decoded: DecodedValue, reason: impl Into<String>) -> Self {
        Self::IncompleteTasks {
            decoded,
            reason: reason.into(),
        }
    }

    /// Which of the three failure kinds this is
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::InvalidJson { .. } => ParseErrorKind::InvalidJson,
            Self::IncompleteTool { .. } => ParseErrorKind::IncompleteTool,
            Self::IncompleteTasks { .. } => ParseErrorKind::IncompleteTasks,
        }
    }

    /// Original model text, for `InvalidJson`
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::InvalidJson { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Decoded structure, for `IncompleteTool` and `IncompleteTasks`
    pub fn decoded(&self) -> Option<&DecodedValue> {
        match self {
            Self::InvalidJson { .. } => None,
            Self::IncompleteTool { decoded, .. } | Self::IncompleteTasks { decoded, .. } => {
                Some(decoded)
            }
        }
    }
}

/// Tag of a [`ParseError`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    InvalidJson,
    IncompleteTool,
    IncompleteTasks,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidJson => "invalid_json",
            Self::IncompleteTool => "incomplete_tool",
            Self::IncompleteTasks => "incomplete_tasks",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error as _;

    fn decode_error() -> DecodeError {
        DecodeError::Syntax {
            message: "expected a value, found end of input".to_string(),
            line: 1,
            column: 10,
        }
    }

    #[test]
    fn test_invalid_json_keeps_raw_text() {
        let err = ParseError::invalid_json("{\"tool\": {", decode_error());
        assert_eq!(err.kind(), ParseErrorKind::InvalidJson);
        assert_eq!(err.raw_text(), Some("{\"tool\": {"));
        assert!(err.decoded().is_none());
        assert!(err.to_string().starts_with("Could not parse invalid json: {\"tool\": {"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_invalid_json_display_is_bounded() {
        let raw = "y".repeat(10_000);
        let err = ParseError::invalid_json(&raw, decode_error());
        assert!(err.to_string().len() < 1000);
        assert_eq!(err.raw_text().map(str::len), Some(10_000));
    }

    #[test]
    fn test_incomplete_variants_carry_decoded() {
        let decoded = json!({"tool": {"args": {}}});
        let err = ParseError::incomplete_tool(decoded.clone(), "missing name");
        assert_eq!(err.kind(), ParseErrorKind::IncompleteTool);
        assert_eq!(err.decoded(), Some(&decoded));
        assert!(err.raw_text().is_none());
        assert!(err.to_string().contains("missing name"));

        let err = ParseError::incomplete_tasks(json!({"notasks": 1}), "missing tasks");
        assert_eq!(err.kind(), ParseErrorKind::IncompleteTasks);
        assert!(err.to_string().contains("notasks"));
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(ParseErrorKind::IncompleteTasks.to_string(), "incomplete_tasks");
        assert_eq!(
            serde_json::to_value(ParseErrorKind::InvalidJson).unwrap(),
            json!("invalid_json")
        );
    }
}
