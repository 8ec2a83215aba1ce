//! Output parsing for agent replies
//!
//! This crate turns the free-form text a language model produces into typed,
//! machine-actionable results: either a single tool invocation ([`Action`])
//! or a list of planning tasks ([`TaskList`]).
//!
//! # Modules
//!
//! - `action` - Result types handed to the agent loop
//! - `decoder` - Lenient JSON-superset decoder (comments, single quotes, bare keys)
//! - `normalizer` - Text cleanup strategies applied before decoding
//! - `sink` - Observability sinks receiving advisory fields
//! - `parser` - The `OutputParser` component
//! - `error` - Parse error taxonomy
//! - `config` - Parser configuration with environment variable loading
//! - `logging` - Helpers for rendering model text in logs
//!
//! # Example
//!
//! ```rust
//! use output_parser::{NoopSink, OutputParser};
//!
//! let parser = OutputParser::new().with_sink(NoopSink);
//! let reply = r#"```json
//! {
//!     thoughts: { text: 'look it up' },
//!     tool: { name: 'search', args: { query: 'rust json5' } }, // pick one
//! }
//! ```"#;
//!
//! let action = parser.parse(reply).unwrap();
//! assert_eq!(action.name, "search");
//! assert_eq!(action.args["query"], "rust json5");
//! ```

pub mod action;
pub mod config;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod normalizer;
pub mod parser;
pub mod sink;

pub use action::{Action, TaskList};
pub use config::{ConfigBuilder, ConfigError, ConfigOverrides, ParserConfig};
pub use decoder::{DecodeError, DecodedValue, DecoderOptions, LenientDecoder};
pub use error::{ParseError, ParseErrorKind, Result};
pub use normalizer::{ActionNormalizer, TaskNormalizer, TextNormalizer};
pub use parser::OutputParser;
pub use sink::{MemorySink, NoopSink, ObservabilitySink, TracingSink};

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
