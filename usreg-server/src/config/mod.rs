//! Configuration module for usreg-server.
//!
//! Handles loading configuration from a TOML file and merging in the
//! identifiers given on the command line.

pub mod file;

use crate::config::file::FileConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./usreg.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    /// When false, a missing file falls back to defaults.
    required: bool,
    extra_seed_users: Vec<String>,
    extra_intake_users: Vec<String>,
}

impl ConfigLoader {
    /// Create a loader for an explicitly requested file, or for
    /// [`DEFAULT_CONFIG_PATH`] if `config_path` is `None`.
    pub fn new(config_path: Option<&Path>) -> Self {
        let (config_path, required) = match config_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        Self {
            config_path,
            required,
            extra_seed_users: Vec::new(),
            extra_intake_users: Vec::new(),
        }
    }

    /// Identifiers from the command line, appended after the file's lists.
    pub fn with_users(mut self, seed_users: Vec<String>, intake_users: Vec<String>) -> Self {
        self.extra_seed_users = seed_users;
        self.extra_intake_users = intake_users;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file (or use defaults if the default file is absent)
    /// 2. Append command line identifiers
    /// 3. Validate the result
    pub fn load(&self) -> Result<FileConfig, ConfigError> {
        let mut config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if !self.required && e.kind() == std::io::ErrorKind::NotFound => {
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        config
            .registry
            .seed_users
            .extend(self.extra_seed_users.iter().cloned());
        config
            .registry
            .intake_users
            .extend(self.extra_intake_users.iter().cloned());

        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        EnvFilter::try_new(&config.logging.filter).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid log filter {:?}: {}",
                config.logging.filter, e
            ))
        })?;
        Ok(())
    }
}
