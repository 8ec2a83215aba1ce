//! Environment variable loading utilities
//!
//! Helper functions for loading and parsing environment variables with proper error handling.

use super::ConfigError;
use std::env;
use std::str::FromStr;

/// Load an environment variable as a string
///
/// # Returns
///
/// * `Ok(Some(value))` if variable exists
/// * `Ok(None)` if variable doesn't exist
/// * `Err` if variable exists but has invalid UTF-8
pub fn get_env(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::Env {
            key: key.to_string(),
            message: "contains invalid UTF-8".to_string(),
        }),
    }
}

/// Load and parse an environment variable
///
/// # Returns
///
/// * `Ok(Some(value))` if variable exists and parses successfully
/// * `Ok(None)` if variable doesn't exist
/// * `Err` if variable exists but fails to parse
///
/// # Example
///
/// ```rust,ignore
/// let depth: Option<usize> = get_env_parse("OUTPUT_PARSER_MAX_DEPTH")?;
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => {
            let parsed = val.trim().parse::<T>().map_err(|e| ConfigError::Env {
                key: key.to_string(),
                message: format!("failed to parse {:?}: {}", val, e),
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Load a boolean environment variable
///
/// Recognizes: "true", "1", "yes", "on" (case-insensitive) as true
/// Recognizes: "false", "0", "no", "off" (case-insensitive) as false
pub fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match get_env(key)? {
        Some(val) => {
            let result = match val.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Env {
                        key: key.to_string(),
                        message: format!("invalid boolean value {:?}", val),
                    })
                }
            };
            Ok(Some(result))
        }
        None => Ok(None),
    }
}

/// Build a prefixed environment variable name
///
/// # Example
///
/// ```rust
/// use output_parser::config::build_env_key;
///
/// assert_eq!(build_env_key("OUTPUT_PARSER_", "max_depth"), "OUTPUT_PARSER_MAX_DEPTH");
/// ```
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}
