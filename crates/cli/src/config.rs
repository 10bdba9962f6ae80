//! # CLI Configuration
//!
//! Loads an `EnrichConfig` from three layers, later layers winning:
//! 1. The built-in defaults of every section.
//! 2. An optional YAML file. `${VAR}` placeholders are replaced with the
//!    value of the environment variable (empty when unset).
//! 3. `DCENRICH_`-prefixed environment variables, with `__` between nested
//!    keys (e.g. `DCENRICH_NER__CONFIDENCE_THRESHOLD=0.8`).

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use dcenrich::EnrichConfig;
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "dcenrich.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    #[error("Configuration error: {0}")]
    General(String),
    /// A config file that was explicitly requested does not exist.
    #[error("Config file not found at '{0}'")]
    NotFound(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Refusing to overwrite existing file '{0}'")]
    AlreadyExists(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

// Reads a file and substitutes `${VAR}` placeholders from the environment.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded.into_owned()))
}

/// Loads the configuration.
///
/// With `config_path_override` the file must exist. Without it,
/// `dcenrich.yml` in the working directory is used when present.
pub fn get_config(config_path_override: Option<&Path>) -> Result<EnrichConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    let file_content = match config_path_override {
        Some(path) => Some(
            read_and_substitute(path)?
                .ok_or_else(|| ConfigError::NotFound(path.display().to_string()))?,
        ),
        None => read_and_substitute(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    if let Some(content) = file_content {
        info!(
            "Loading configuration from '{}'",
            config_path_override.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)).display()
        );
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("DCENRICH")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    // Sections and fields missing from every layer fall back to their defaults.
    let config: EnrichConfig = settings.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

/// Rejects settings the pipeline cannot work with.
pub fn validate(config: &EnrichConfig) -> Result<(), ConfigError> {
    if config.image_captioning.model_name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "image_captioning.model_name must not be empty".to_string(),
        ));
    }
    for (key, value) in [
        ("ner.confidence_threshold", config.ner.confidence_threshold),
        ("ner.default_confidence", config.ner.default_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Invalid(format!(
                "{key} must be within [0, 1], got {value}"
            )));
        }
    }
    if config.linking.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "linking.timeout_secs must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Writes `config` to `path` as YAML. An existing file is left untouched.
pub fn write_config_file(path: &Path, config: &EnrichConfig) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.display().to_string()));
    }
    let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::General(e.to_string()))?;
    fs::write(path, yaml).map_err(|e| {
        ConfigError::General(format!("Failed to write '{}': {e}", path.display()))
    })?;
    Ok(())
}
