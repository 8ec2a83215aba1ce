//! The output parser component
//!
//! [`OutputParser`] runs every reply through the same linear pipeline:
//!
//! ```text
//! normalize -> decode -> extract & validate -> Action | TaskList | ParseError
//! ```
//!
//! It holds no mutable state. A single instance can be shared across threads
//! and tasks; concurrent calls never observe each other.

use crate::action::{Action, TaskList};
use crate::config::ParserConfig;
use crate::decoder::{DecodedValue, LenientDecoder};
use crate::error::{ParseError, Result};
use crate::logging::format_bytes;
use crate::normalizer::{
    ActionNormalizer, PassthroughNormalizer, TaskNormalizer, TextNormalizer,
};
use crate::sink::{ObservabilitySink, TracingSink};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Keys of the `thoughts` entry forwarded to the sink, in order, with the
/// capitalized field name each is recorded under
pub const THOUGHT_FIELDS: [(&str, &str); 4] = [
    ("text", "Text"),
    ("reasoning", "Reasoning"),
    ("plan", "Plan"),
    ("criticism", "Criticism"),
];

/// Sink field carrying the selected tool name
pub const TOOL_FIELD: &str = "Tool";

/// Sink field carrying the raw `tasks` value
pub const TASKS_FIELD: &str = "Tasks";

/// Parser turning model replies into [`Action`]s and [`TaskList`]s
///
/// # Example
///
/// ```rust
/// use output_parser::{MemorySink, OutputParser, ParseErrorKind};
///
/// let sink = MemorySink::new();
/// let parser = OutputParser::new().with_sink(sink.clone());
///
/// let action = parser
///     .parse(r#"{"thoughts": {"plan": "read it"}, "tool": {"name": "read_file", "args": {"file_name": "notes.txt"}}}"#)
///     .unwrap();
/// assert_eq!(action.name, "read_file");
/// assert_eq!(sink.fields(), vec!["Plan", "Tool"]);
///
/// let none = parser.parse(r#"{"thoughts": {}, "tool": null}"#).unwrap();
/// assert!(none.is_none());
///
/// let err = parser.parse_tasks(r#"{"notasks": 1}"#).unwrap_err();
/// assert_eq!(err.kind(), ParseErrorKind::IncompleteTasks);
/// ```
#[derive(Clone)]
pub struct OutputParser {
    config: ParserConfig,
    action_decoder: LenientDecoder,
    task_decoder: LenientDecoder,
    action_normalizer: Arc<dyn TextNormalizer>,
    task_normalizer: Arc<dyn TextNormalizer>,
    sink: Arc<dyn ObservabilitySink>,
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::with_config(ParserConfig::default())
    }
}

impl fmt::Debug for OutputParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputParser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OutputParser {
    /// Create a parser with default configuration, the standard
    /// normalizers, and a [`TracingSink`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from configuration
    ///
    /// With `normalize` disabled, replies go to the decoder untouched.
    pub fn with_config(config: ParserConfig) -> Self {
        let (action_normalizer, task_normalizer): (
            Arc<dyn TextNormalizer>,
            Arc<dyn TextNormalizer>,
        ) = if config.normalize {
            (Arc::new(ActionNormalizer), Arc::new(TaskNormalizer))
        } else {
            (Arc::new(PassthroughNormalizer), Arc::new(PassthroughNormalizer))
        };

        Self {
            action_decoder: LenientDecoder::new(config.decoder_options(false)),
            task_decoder: LenientDecoder::new(config.decoder_options(true)),
            action_normalizer,
            task_normalizer,
            sink: Arc::new(TracingSink::new().with_max_chars(config.max_logged_value_chars)),
            config,
        }
    }

    /// Replace the observability sink
    pub fn with_sink(mut self, sink: impl ObservabilitySink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Replace the observability sink with a shared one
    pub fn with_shared_sink(mut self, sink: Arc<dyn ObservabilitySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the normalizer used by [`parse`](Self::parse)
    pub fn with_action_normalizer(mut self, normalizer: impl TextNormalizer + 'static) -> Self {
        self.action_normalizer = Arc::new(normalizer);
        self
    }

    /// Replace the normalizer used by [`parse_tasks`](Self::parse_tasks)
    pub fn with_task_normalizer(mut self, normalizer: impl TextNormalizer + 'static) -> Self {
        self.task_normalizer = Arc::new(normalizer);
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a reply carrying `thoughts` and a `tool` selection
    ///
    /// A missing, `null`, or empty `tool` entry is not an error: it yields
    /// [`Action::none`].
    pub fn parse(&self, text: &str) -> Result<Action> {
        debug!(size = %format_bytes(text.len()), "Parsing action reply");

        let normalized = self.action_normalizer.normalize(text);
        let parsed = self
            .action_decoder
            .decode(&normalized)
            .map_err(|e| ParseError::invalid_json(text, e))?;

        if !parsed.is_object() {
            return Err(ParseError::incomplete_tool(parsed, "reply is not an object"));
        }

        if let Some(thoughts) = parsed.get("thoughts").and_then(Value::as_object) {
            for (key, field) in THOUGHT_FIELDS {
                if let Some(value) = thoughts.get(key) {
                    self.sink.record(field, value);
                }
            }
        }

        let selected = match parsed.get("tool") {
            Some(tool) if !is_falsy(tool) => extract_tool(tool),
            _ => {
                debug!("No tool selected");
                return Ok(Action::none());
            }
        };

        let action = selected.map_err(|reason| ParseError::incomplete_tool(parsed, reason))?;

        if !action.name.is_empty() {
            self.sink.record(TOOL_FIELD, &Value::String(action.name.clone()));
        }

        Ok(action)
    }

    /// Parse a reply carrying a `tasks` list
    ///
    /// An empty list is a valid plan; a missing or non-list `tasks` entry is
    /// an error.
    pub fn parse_tasks(&self, text: &str) -> Result<TaskList> {
        debug!(size = %format_bytes(text.len()), "Parsing task list reply");

        let normalized = self.task_normalizer.normalize(text);
        let parsed = self
            .task_decoder
            .decode(&normalized)
            .map_err(|e| ParseError::invalid_json(text, e))?;

        let Some(tasks) = parsed.get("tasks").cloned() else {
            let reason = if parsed.is_object() {
                "missing 'tasks' entry"
            } else {
                "reply is not an object"
            };
            return Err(ParseError::incomplete_tasks(parsed, reason));
        };
        self.sink.record(TASKS_FIELD, &tasks);

        match tasks {
            Value::Array(items) => Ok(TaskList::new(items)),
            _ => Err(ParseError::incomplete_tasks(parsed, "'tasks' is not a list")),
        }
    }
}

/// Map a non-falsy `tool` entry to an action, or explain why it can't be
fn extract_tool(tool: &DecodedValue) -> std::result::Result<Action, String> {
    let Some(entry) = tool.as_object() else {
        return Err(format!("'tool' must be an object, got {}", type_name(tool)));
    };

    let name = match entry.get("name") {
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(format!(
                "tool 'name' must be a string, got {}",
                type_name(other)
            ))
        }
        None => return Err("tool is missing 'name'".to_string()),
    };

    if name.is_empty() {
        return Ok(Action::none());
    }

    let args = match entry.get("args") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args.clone(),
        Some(other) => {
            return Err(format!(
                "tool 'args' must be an object, got {}",
                type_name(other)
            ))
        }
    };

    Ok(Action::new(name.clone(), args))
}

/// Values that count as "no selection"
fn is_falsy(value: &DecodedValue) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn type_name(value: &DecodedValue) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
