//! Shared configuration types for Parley
//!
//! Configuration is loaded from environment variables with development
//! defaults, so the binary runs against a local Ollama with no setup.

mod error;
mod ollama;

pub use error::{ConfigError, ConfigResult};
pub use ollama::OllamaConfig;

use std::env;

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
