//! Lenient structural decoder
//!
//! Models asked for JSON rarely produce strict JSON. This module reads the
//! JSON5-style superset they actually emit:
//!
//! - `"double"` and `'single'` quoted strings
//! - `//` line comments and `/* */` block comments
//! - trailing commas in objects and arrays
//! - bare identifiers as object keys (`{name: "search"}`)
//! - numbers with a leading `+`, a leading or trailing `.`, or a `0x` prefix
//!
//! The reader is a single forward pass with no backtracking, so decoding
//! time is linear in the input length. Nesting depth and input size are
//! bounded by [`DecoderOptions`].
//!
//! # Example
//!
//! ```rust
//! use output_parser::decoder::LenientDecoder;
//!
//! let decoder = LenientDecoder::default();
//! let value = decoder.decode("{tool: {name: 'search',}, /* note */}").unwrap();
//! assert_eq!(value["tool"]["name"], "search");
//! ```

mod reader;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dynamically shaped tree produced by decoding
///
/// Objects keep the order in which keys appeared in the reply. All
/// accessors (`get`, `as_object`, `as_str`, ...) return `Option`s.
pub type DecodedValue = serde_json::Value;

/// Default upper bound on input size (1 MiB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Default nesting limit
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Errors reported by the decoder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input rejected before scanning
    #[error("input is {size} bytes, limit is {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// Nesting exceeded the configured limit
    #[error("nesting deeper than {limit} levels at line {line} column {column}")]
    TooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },

    /// Malformed input
    #[error("{message} at line {line} column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
}

impl DecodeError {
    /// 1-based line of the error, when it has a position
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::InputTooLarge { .. } => None,
            Self::TooDeep { line, .. } | Self::Syntax { line, .. } => Some(*line),
        }
    }

    /// 1-based column (in characters) of the error, when it has a position
    pub fn column(&self) -> Option<usize> {
        match self {
            Self::InputTooLarge { .. } => None,
            Self::TooDeep { column, .. } | Self::Syntax { column, .. } => Some(*column),
        }
    }
}

/// Resource bounds and strictness for [`LenientDecoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderOptions {
    /// Inputs longer than this are rejected without being scanned
    pub max_input_bytes: usize,

    /// Maximum nesting of objects and arrays
    pub max_depth: usize,

    /// Accept raw control characters (newlines, tabs, ...) inside strings
    pub allow_control_characters: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            allow_control_characters: false,
        }
    }
}

impl DecoderOptions {
    /// Create options with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input size limit
    pub fn with_max_input_bytes(mut self, bytes: usize) -> Self {
        self.max_input_bytes = bytes;
        self
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enable or disable raw control characters inside strings
    pub fn with_control_characters(mut self, allowed: bool) -> Self {
        self.allow_control_characters = allowed;
        self
    }
}

/// Decoder for the JSON superset models emit
#[derive(Debug, Clone, Default)]
pub struct LenientDecoder {
    options: DecoderOptions,
}

impl LenientDecoder {
    /// Create a decoder with the given options
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode a complete document
    ///
    /// The whole input must be a single value, optionally surrounded by
    /// whitespace and comments.
    pub fn decode(&self, text: &str) -> Result<DecodedValue, DecodeError> {
        if text.len() > self.options.max_input_bytes {
            return Err(DecodeError::InputTooLarge {
                size: text.len(),
                limit: self.options.max_input_bytes,
            });
        }

        reader::Reader::new(text, &self.options).read_document()
    }
}

/// Decode with default options
pub fn decode(text: &str) -> Result<DecodedValue, DecodeError> {
    LenientDecoder::default().decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_strict_json() {
        let value = decode(r#"{"a": [1, 2.5, "x", true, false, null]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, "x", true, false, null]}));
    }

    #[test]
    fn test_decode_superset_grammar() {
        let text = r#"
            // leading comment
            {
                name: 'search', /* inline */
                "args": {'query': "it's", limit: +10, ratio: .5,},
                list: [1, 2, 3,],
            }
        "#;
        let value = decode(text).unwrap();
        assert_eq!(value["name"], "search");
        assert_eq!(value["args"]["query"], "it's");
        assert_eq!(value["args"]["limit"], 10);
        assert_eq!(value["args"]["ratio"], 0.5);
        assert_eq!(value["list"], json!([1, 2, 3]));
    }

    #[test]
    fn test_decode_preserves_key_order() {
        let value = decode("{z: 1, a: 2, m: 3}").unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let err = decode(r#"{"tool": {"#).unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let decoder = LenientDecoder::new(DecoderOptions::new().with_max_input_bytes(8));
        let err = decoder.decode(r#"{"key": "value"}"#).unwrap_err();
        assert_eq!(err, DecodeError::InputTooLarge { size: 16, limit: 8 });
        assert!(err.line().is_none());
    }

    #[test]
    fn test_decode_depth_limit() {
        let decoder = LenientDecoder::new(DecoderOptions::new().with_max_depth(3));
        assert!(decoder.decode("[[[1]]]").is_ok());

        let err = decoder.decode("[[[[1]]]]").unwrap_err();
        assert!(matches!(err, DecodeError::TooDeep { limit: 3, .. }));
    }

    #[test]
    fn test_control_characters_need_non_strict_mode() {
        let text = "{\"text\": \"line one\nline two\"}";
        assert!(decode(text).is_err());

        let relaxed = LenientDecoder::new(DecoderOptions::new().with_control_characters(true));
        let value = relaxed.decode(text).unwrap();
        assert_eq!(value["text"], "line one\nline two");
    }

    #[test]
    fn test_error_display_has_position() {
        let err = decode("{\n  a: ?\n}").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "{}", message);
        assert_eq!(err.column(), Some(6));
    }
}
