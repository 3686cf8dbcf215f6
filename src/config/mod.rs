//! Configuration capability
//!
//! [`Config`] is the read-only key/value view every module gets from
//! [`Application::config`](crate::Application::config). Implementors only
//! provide [`Config::lookup`]; the typed getters parse on top of it and report
//! a [`ConfigError`] instead of falling back to a default.

mod env;
mod error;

pub use env::{ConfigSource, EnvConfig, EnvConfigBuilder};
pub use error::{ConfigError, Result};

use std::collections::HashMap;

/// Key/value configuration source
pub trait Config: Send + Sync {
    /// Raw value for `key`, if any source defines it.
    fn lookup(&self, key: &str) -> Option<String>;

    fn get_string(&self, key: &str) -> Result<String> {
        self.lookup(key).ok_or_else(|| ConfigError::key_missing(key))
    }

    /// Accepts `1 t T TRUE true True 0 f F FALSE false False`.
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(ConfigError::type_mismatch(key, "a boolean", value)),
        }
    }

    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .parse()
            .map_err(|_| ConfigError::type_mismatch(key, "an integer", value))
    }

    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value
            .parse()
            .map_err(|_| ConfigError::type_mismatch(key, "a float", value))
    }

    /// Comma separated list; surrounding whitespace of each item is trimmed.
    fn get_string_slice(&self, key: &str) -> Result<Vec<String>> {
        let value = self.get_string(key)?;
        Ok(value.split(',').map(|item| item.trim().to_string()).collect())
    }

    /// JSON object, e.g. `{"host":"localhost","port":5432}`.
    fn get_string_map(&self, key: &str) -> Result<HashMap<String, serde_json::Value>> {
        let value = self.get_string(key)?;
        serde_json::from_str(&value)
            .map_err(|_| ConfigError::type_mismatch(key, "a JSON object", value))
    }
}
