//! Configuration builder trait
//!
//! Common shape for configuration structures: validation, loading from
//! environment variables, and merging several sources.

use super::ConfigError;

/// Trait for configuration structures that support building, validation, and merging
///
/// # Example
///
/// ```rust
/// use output_parser::config::{ConfigBuilder, ConfigError};
///
/// #[derive(Clone, Default)]
/// struct LimitConfig {
///     limit: usize,
/// }
///
/// impl ConfigBuilder for LimitConfig {
///     fn validate(&self) -> Result<(), ConfigError> {
///         if self.limit == 0 {
///             return Err(ConfigError::Invalid("limit must be non-zero".into()));
///         }
///         Ok(())
///     }
///
///     fn from_env(_prefix: &str) -> Result<Self, ConfigError> {
///         Ok(Self { limit: 10 })
///     }
///
///     fn merge(&mut self, other: Self) -> &mut Self {
///         if other.limit != 0 {
///             self.limit = other.limit;
///         }
///         self
///     }
/// }
///
/// let config = LimitConfig::from_env_with_defaults("APP_").unwrap();
/// assert_eq!(config.limit, 10);
/// ```
pub trait ConfigBuilder: Default + Clone {
    /// Validate the configuration
    ///
    /// Returns an error if a value is out of range.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `{PREFIX}{FIELD_NAME}` where FIELD_NAME
    /// is the uppercased field name. Unset variables keep their defaults.
    fn from_env(prefix: &str) -> Result<Self, ConfigError>;

    /// Merge another configuration into this one
    ///
    /// Values set in `other` take precedence. Returns self for chaining.
    fn merge(&mut self, other: Self) -> &mut Self;

    /// Create, validate, and return the default configuration
    fn build() -> Result<Self, ConfigError> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Load from environment, merge defaults, and validate
    fn from_env_with_defaults(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_env(prefix)?;
        let defaults = Self::default();
        config.merge(defaults);
        config.validate()?;
        Ok(config)
    }
}
