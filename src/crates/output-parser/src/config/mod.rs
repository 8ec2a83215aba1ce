//! Parser configuration
//!
//! [`ParserConfig`] carries the resource bounds of the parser. It can be
//! built in code, loaded from `OUTPUT_PARSER_*` environment variables, or
//! read from a TOML file:
//!
//! ```toml
//! max_input_bytes = 262144
//! max_depth = 64
//! normalize = true
//! max_logged_value_chars = 500
//! ```
//!
//! # Example
//!
//! ```rust
//! use output_parser::config::{ConfigBuilder, ParserConfig};
//!
//! let config = ParserConfig::from_toml_str("max_depth = 32").unwrap();
//! assert_eq!(config.max_depth, 32);
//! assert_eq!(config.max_input_bytes, ParserConfig::default().max_input_bytes);
//! assert!(config.validate().is_ok());
//! ```

mod builder;
mod env;

pub use builder::ConfigBuilder;
pub use env::{build_env_key, get_env, get_env_bool, get_env_parse};

use crate::decoder::{DecoderOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT_BYTES};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Prefix of the environment variables read by [`ParserConfig::from_env`]
pub const ENV_PREFIX: &str = "OUTPUT_PARSER_";

/// Largest accepted `max_depth`
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable present but unusable
    #[error("Environment variable {key}: {message}")]
    Env { key: String, message: String },

    /// Value out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this structure
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Resource bounds and behavior switches for [`OutputParser`](crate::OutputParser)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Replies longer than this fail with `InvalidJson` without being scanned
    pub max_input_bytes: usize,

    /// Maximum nesting of objects and arrays in a reply
    pub max_depth: usize,

    /// Run the text normalizers before decoding
    pub normalize: bool,

    /// Cap on the length of values written to logs by the tracing sink
    pub max_logged_value_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            normalize: true,
            max_logged_value_chars: 2000,
        }
    }
}

impl ParserConfig {
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

    /// Enable or disable normalization
    pub fn with_normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Set the cap on logged value length
    pub fn with_max_logged_value_chars(mut self, chars: usize) -> Self {
        self.max_logged_value_chars = chars;
        self
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        ConfigOverrides::from_toml_str(text)?.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Decoder options for the given strictness
    pub fn decoder_options(&self, allow_control_characters: bool) -> DecoderOptions {
        DecoderOptions::new()
            .with_max_input_bytes(self.max_input_bytes)
            .with_max_depth(self.max_depth)
            .with_control_characters(allow_control_characters)
    }
}

/// Settings present in one configuration layer
///
/// Unlike [`ConfigBuilder::merge`], which can only tell a set value from an
/// unset one by comparing against the defaults, an override records exactly
/// which keys a layer named. Applying it replaces those keys and nothing else.
///
/// # Example
///
/// ```rust
/// use output_parser::config::{ConfigOverrides, ParserConfig};
///
/// let mut config = ParserConfig::new().with_max_depth(16);
/// ConfigOverrides::from_toml_str("max_depth = 128").unwrap().apply(&mut config);
/// assert_eq!(config.max_depth, 128);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub max_input_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub normalize: Option<bool>,
    pub max_logged_value_chars: Option<usize>,
}

impl ConfigOverrides {
    /// Parse a TOML document; only the keys it contains are set
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Replace the fields of `config` named by this layer
    pub fn apply(&self, config: &mut ParserConfig) {
        if let Some(bytes) = self.max_input_bytes {
            config.max_input_bytes = bytes;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(normalize) = self.normalize {
            config.normalize = normalize;
        }
        if let Some(chars) = self.max_logged_value_chars {
            config.max_logged_value_chars = chars;
        }
    }
}

impl ConfigBuilder for ParserConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_input_bytes must be non-zero".to_string(),
            ));
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        if self.max_logged_value_chars == 0 {
            return Err(ConfigError::Invalid(
                "max_logged_value_chars must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bytes) = get_env_parse(&build_env_key(prefix, "max_input_bytes"))? {
            config.max_input_bytes = bytes;
        }
        if let Some(depth) = get_env_parse(&build_env_key(prefix, "max_depth"))? {
            config.max_depth = depth;
        }
        if let Some(normalize) = get_env_bool(&build_env_key(prefix, "normalize"))? {
            config.normalize = normalize;
        }
        if let Some(chars) = get_env_parse(&build_env_key(prefix, "max_logged_value_chars"))? {
            config.max_logged_value_chars = chars;
        }

        Ok(config)
    }

    /// Fields of `other` that differ from the defaults overwrite `self`
    ///
    /// A field set back to its default value is indistinguishable from an
    /// unset one here; layers that must win regardless go through
    /// [`ConfigOverrides`].
    fn merge(&mut self, other: Self) -> &mut Self {
        let defaults = Self::default();

        if other.max_input_bytes != defaults.max_input_bytes {
            self.max_input_bytes = other.max_input_bytes;
        }
        if other.max_depth != defaults.max_depth {
            self.max_depth = other.max_depth;
        }
        if other.normalize != defaults.normalize {
            self.normalize = other.normalize;
        }
        if other.max_logged_value_chars != defaults.max_logged_value_chars {
            self.max_logged_value_chars = other.max_logged_value_chars;
        }
        self
    }
}
