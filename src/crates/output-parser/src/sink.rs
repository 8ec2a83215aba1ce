//! Observability sinks
//!
//! The parser forwards advisory fields (the model's thoughts, the selected
//! tool name, the raw task list) to a sink instead of logging them itself.
//! A sink never influences the outcome of a parse.

use crate::decoder::DecodedValue;
use crate::logging::{sanitize_for_logging, value_preview};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Receiver for advisory fields extracted during parsing
pub trait ObservabilitySink: Send + Sync {
    /// Record one field
    fn record(&self, field: &str, value: &DecodedValue);
}

/// Sink that emits each field as a `tracing` event at INFO level
///
/// String values are logged verbatim, anything else as compact JSON.
/// Values are sanitized for secrets and capped at `max_chars` characters.
#[derive(Debug, Clone)]
pub struct TracingSink {
    max_chars: usize,
}

impl TracingSink {
    /// Default cap on logged value length
    pub const DEFAULT_MAX_CHARS: usize = 2000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cap on logged value length
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self {
            max_chars: Self::DEFAULT_MAX_CHARS,
        }
    }
}

impl ObservabilitySink for TracingSink {
    fn record(&self, field: &str, value: &DecodedValue) {
        let rendered = sanitize_for_logging(&value_preview(value, self.max_chars));
        info!(target: "output_parser", field, value = %rendered, "{}: {}", field, rendered);
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ObservabilitySink for NoopSink {
    fn record(&self, _field: &str, _value: &DecodedValue) {}
}

/// Sink that keeps every recorded field in memory
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(String, DecodedValue)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn entries(&self) -> Vec<(String, DecodedValue)> {
        self.entries.lock().clone()
    }

    /// Names of the recorded fields, in order
    pub fn fields(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(field, _)| field.clone())
            .collect()
    }

    /// Most recent value recorded under `field`
    pub fn get(&self, field: &str) -> Option<DecodedValue> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<(String, DecodedValue)> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ObservabilitySink for MemorySink {
    fn record(&self, field: &str, value: &DecodedValue) {
        self.entries.lock().push((field.to_string(), value.clone()));
    }
}

impl<F> ObservabilitySink for F
where
    F: Fn(&str, &DecodedValue) + Send + Sync,
{
    fn record(&self, field: &str, value: &DecodedValue) {
        self(field, value)
    }
}
