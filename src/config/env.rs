use super::{Config, ConfigError, Result};
use crate::lifecycle::Application;
use crate::module::{Initializer, Module};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One place configuration values are read from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Fixed values, usually listed first so any other source can override them
    Defaults(Vec<(String, String)>),
    /// A dotenv file that must exist
    File(PathBuf),
    /// A dotenv file that is skipped when absent
    OptionalFile(PathBuf),
    /// The process environment
    Environment,
}

/// Immutable configuration snapshot loaded once from dotenv files and the environment.
///
/// Sources are applied in order and later sources override earlier ones. Loading
/// never touches the process environment.
///
/// # Example
/// ```
/// use modulus::config::{Config, EnvConfig};
///
/// let config = EnvConfig::builder()
///     .defaults([("PORT", "3000")])
///     .optional_file(".env.does-not-exist")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.get_int("PORT").unwrap(), 3000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    values: HashMap<String, String>,
    loaded_files: Vec<PathBuf>,
    missing_files: Vec<PathBuf>,
}

impl EnvConfig {
    pub fn builder() -> EnvConfigBuilder {
        EnvConfigBuilder::default()
    }

    /// `.env`, then `.env.{APP_ENV}` when `APP_ENV` is set, then the process environment.
    ///
    /// A malformed dotenv file is reported and the configuration falls back to
    /// the process environment alone.
    pub fn from_default_sources() -> Self {
        let mut builder = Self::builder().optional_file(".env");
        if let Ok(app_env) = std::env::var("APP_ENV") {
            builder = builder.optional_file(format!(".env.{app_env}"));
        }

        match builder.environment().build() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Ignoring dotenv files, using process environment only"
                );
                let mut config = Self::default();
                config.apply_environment();
                config
            }
        }
    }

    pub fn from_map<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dotenv files that were found and applied.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    /// Optional dotenv files that did not exist.
    pub fn missing_files(&self) -> &[PathBuf] {
        &self.missing_files
    }

    fn apply_environment(&mut self) {
        // Non-unicode variables cannot be looked up by a &str key anyway.
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        self.values.extend(vars);
    }

    fn apply_file(&mut self, path: &Path, required: bool) -> Result<()> {
        let source_err = |source| ConfigError::Source {
            path: path.to_path_buf(),
            source,
        };

        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(err) if err.not_found() && !required => {
                self.missing_files.push(path.to_path_buf());
                return Ok(());
            }
            Err(err) => return Err(source_err(err)),
        };

        for entry in entries {
            let (key, value) = entry.map_err(source_err)?;
            self.values.insert(key, value);
        }
        self.loaded_files.push(path.to_path_buf());
        Ok(())
    }
}

impl Config for EnvConfig {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl Module for EnvConfig {
    fn name(&self) -> &str {
        "EnvConfig"
    }

    fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn Initializer>> {
        Some(self)
    }

    fn as_config(self: Arc<Self>) -> Option<Arc<dyn Config>> {
        Some(self)
    }
}

#[async_trait]
impl Initializer for EnvConfig {
    async fn init(&self, app: &Application) -> anyhow::Result<()> {
        let logger = app.logger();
        for path in &self.missing_files {
            logger.info(format_args!("No {} file found", path.display()));
        }
        for path in &self.loaded_files {
            logger.debug(format_args!("Loaded configuration from {}", path.display()));
        }
        Ok(())
    }
}

/// Builder collecting the ordered list of configuration sources
#[derive(Debug, Default)]
pub struct EnvConfigBuilder {
    sources: Vec<ConfigSource>,
}

impl EnvConfigBuilder {
    pub fn source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn defaults<K, V>(self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.source(ConfigSource::Defaults(values))
    }

    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.source(ConfigSource::File(path.into()))
    }

    pub fn optional_file(self, path: impl Into<PathBuf>) -> Self {
        self.source(ConfigSource::OptionalFile(path.into()))
    }

    pub fn environment(self) -> Self {
        self.source(ConfigSource::Environment)
    }

    /// Read every source in order.
    ///
    /// # Errors
    /// Returns `ConfigError::Source` if a required file is missing or any file is malformed.
    pub fn build(self) -> Result<EnvConfig> {
        let mut config = EnvConfig::default();
        for source in self.sources {
            match source {
                ConfigSource::Defaults(values) => config.values.extend(values),
                ConfigSource::File(path) => config.apply_file(&path, true)?,
                ConfigSource::OptionalFile(path) => config.apply_file(&path, false)?,
                ConfigSource::Environment => config.apply_environment(),
            }
        }
        Ok(config)
    }
}
